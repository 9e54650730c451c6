//! The rendering surface seam.
//!
//! A [`RenderSurface`] is the external map renderer: it owns named GeoJSON
//! sources and style layers drawn from them, a cursor, and a single popup.
//! Every mutation goes through [`crate::MapController`] and the
//! reconcilers; nothing else holds a surface.

use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display};

use crate::SurfaceError;

/// Style layer kinds used by the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LayerType {
    Circle,
    Fill,
    Line,
    Symbol,
}

/// Layout visibility of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Visible,
    None,
}

impl From<bool> for Visibility {
    fn from(visible: bool) -> Self {
        if visible { Self::Visible } else { Self::None }
    }
}

/// Pointer cursor over the map canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

/// A style layer definition in Mapbox GL style form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    pub source: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub layout: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub paint: Map<String, Value>,
}

impl LayerSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, layer_type: LayerType, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layer_type,
            source: source.into(),
            layout: Map::new(),
            paint: Map::new(),
        }
    }

    #[must_use]
    pub fn paint(mut self, name: &str, value: Value) -> Self {
        self.paint.insert(name.to_string(), value);
        self
    }

    #[must_use]
    pub fn layout(mut self, name: &str, value: Value) -> Self {
        self.layout.insert(name.to_string(), value);
        self
    }
}

/// A geographic bounding box as `[lon, lat]` corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: [f64; 2],
    pub north_east: [f64; 2],
}

/// Signals raised by the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The surface finished its initial load.
    Load,
    /// Style data changed; fires repeatedly while the style settles.
    StyleData,
    /// The pointer entered a feature of a layer.
    PointerEnter { layer: String, feature: Feature },
    /// The pointer left a layer.
    PointerLeave { layer: String },
    /// A feature of a layer was clicked.
    Click { layer: String, feature: Feature },
}

/// Operations the map needs from a renderer.
///
/// Methods that can be rejected by the renderer return [`SurfaceError`];
/// callers never rely on panics for failure.
pub trait RenderSurface {
    /// Whether the style has finished loading.
    fn is_style_loaded(&self) -> bool;

    fn has_source(&self, id: &str) -> bool;

    fn has_layer(&self, id: &str) -> bool;

    /// Adds a GeoJSON source.
    ///
    /// # Errors
    ///
    /// Fails if a source with this id already exists.
    fn add_source(&mut self, id: &str, data: &FeatureCollection) -> Result<(), SurfaceError>;

    /// Replaces a source's data wholesale.
    ///
    /// # Errors
    ///
    /// Fails if the source does not exist.
    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), SurfaceError>;

    /// Removes a source.
    ///
    /// # Errors
    ///
    /// Fails if the source does not exist or a layer still draws from it.
    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError>;

    /// Adds a layer on top of the existing ones.
    ///
    /// # Errors
    ///
    /// Fails if the layer exists or its source does not.
    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), SurfaceError>;

    /// Removes a layer.
    ///
    /// # Errors
    ///
    /// Fails if the layer does not exist.
    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError>;

    /// Sets a layer's layout visibility.
    ///
    /// # Errors
    ///
    /// Fails if the layer does not exist.
    fn set_visibility(&mut self, layer: &str, visibility: Visibility) -> Result<(), SurfaceError>;

    /// Sets one paint property of a layer.
    ///
    /// # Errors
    ///
    /// Fails if the layer does not exist.
    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: Value,
    ) -> Result<(), SurfaceError>;

    fn set_cursor(&mut self, cursor: Cursor);

    /// Places the popup at `[lon, lat]` with the given HTML, opening it if
    /// closed and moving it if open.
    fn show_popup(&mut self, at: [f64; 2], html: &str);

    /// Closes the popup if open.
    fn remove_popup(&mut self);

    /// Moves the camera to show `bounds` with `padding` pixels of margin.
    fn fit_bounds(&mut self, bounds: Bounds, padding: u32);
}

/// `[lon, lat]` of a point feature.
#[must_use]
pub fn point_of(feature: &Feature) -> Option<[f64; 2]> {
    match &feature.geometry.as_ref()?.value {
        geojson::Value::Point(p) if p.len() >= 2 => Some([p[0], p[1]]),
        _ => None,
    }
}
