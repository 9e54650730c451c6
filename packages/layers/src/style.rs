//! An in-memory [`RenderSurface`] that accumulates a Mapbox GL style
//! document.
//!
//! The server drives the same controller and reconcilers a live map would,
//! against a `StyleDocument`, and hands the resulting sources and layers
//! to browser clients as JSON.

use std::collections::BTreeMap;

use geojson::FeatureCollection;
use serde::Serialize;
use serde_json::Value;

use crate::SurfaceError;
use crate::surface::{Bounds, Cursor, LayerSpec, RenderSurface, Visibility};

/// Popup as last shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupSnapshot {
    pub at: [f64; 2],
    pub html: String,
}

/// Camera fit request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraFit {
    pub bounds: Bounds,
    pub padding: u32,
}

#[derive(Debug, Clone, Serialize)]
struct SourceEntry {
    #[serde(rename = "type")]
    kind: &'static str,
    data: FeatureCollection,
}

/// Style state built up through [`RenderSurface`] calls.
#[derive(Debug, Clone, Serialize)]
pub struct StyleDocument {
    #[serde(skip)]
    style_loaded: bool,
    sources: BTreeMap<String, SourceEntry>,
    layers: Vec<LayerSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    camera: Option<CameraFit>,
    #[serde(skip)]
    cursor: Cursor,
    #[serde(skip)]
    popup: Option<PopupSnapshot>,
}

impl Default for StyleDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleDocument {
    /// An empty document whose style reports as loaded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style_loaded: true,
            sources: BTreeMap::new(),
            layers: Vec::new(),
            camera: None,
            cursor: Cursor::Default,
            popup: None,
        }
    }

    /// An empty document whose style is still loading.
    #[must_use]
    pub const fn loading() -> Self {
        let mut doc = Self::new();
        doc.style_loaded = false;
        doc
    }

    pub const fn mark_style_loaded(&mut self) {
        self.style_loaded = true;
    }

    /// Layer ids in draw order.
    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.id.as_str())
    }

    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn source_data(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id).map(|s| &s.data)
    }

    /// Visibility of a layer; layers without the property are visible.
    #[must_use]
    pub fn visibility(&self, id: &str) -> Option<Visibility> {
        let layer = self.layer(id)?;
        Some(match layer.layout.get("visibility").and_then(Value::as_str) {
            Some("none") => Visibility::None,
            _ => Visibility::Visible,
        })
    }

    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub const fn popup(&self) -> Option<&PopupSnapshot> {
        self.popup.as_ref()
    }

    #[must_use]
    pub const fn camera(&self) -> Option<&CameraFit> {
        self.camera.as_ref()
    }

    /// Serializes sources, layers, and camera as a style fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature data cannot be serialized.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("version".to_string(), Value::from(8));
        }
        Ok(value)
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut LayerSpec, SurfaceError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| SurfaceError::LayerNotFound { id: id.to_string() })
    }
}

impl RenderSurface for StyleDocument {
    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    fn add_source(&mut self, id: &str, data: &FeatureCollection) -> Result<(), SurfaceError> {
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateSource { id: id.to_string() });
        }
        self.sources.insert(
            id.to_string(),
            SourceEntry {
                kind: "geojson",
                data: data.clone(),
            },
        );
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), SurfaceError> {
        let entry = self
            .sources
            .get_mut(id)
            .ok_or_else(|| SurfaceError::SourceNotFound { id: id.to_string() })?;
        entry.data = data.clone();
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        if let Some(layer) = self.layers.iter().find(|l| l.source == id) {
            return Err(SurfaceError::SourceInUse {
                id: id.to_string(),
                layer: layer.id.clone(),
            });
        }
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SurfaceError::SourceNotFound { id: id.to_string() })
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), SurfaceError> {
        if self.has_layer(&layer.id) {
            return Err(SurfaceError::DuplicateLayer {
                id: layer.id.clone(),
            });
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(SurfaceError::SourceNotFound {
                id: layer.source.clone(),
            });
        }
        self.layers.push(layer.clone());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        let idx = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| SurfaceError::LayerNotFound { id: id.to_string() })?;
        self.layers.remove(idx);
        Ok(())
    }

    fn set_visibility(&mut self, layer: &str, visibility: Visibility) -> Result<(), SurfaceError> {
        self.layer_mut(layer)?
            .layout
            .insert("visibility".to_string(), Value::from(visibility.as_ref()));
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        name: &str,
        value: Value,
    ) -> Result<(), SurfaceError> {
        self.layer_mut(layer)?.paint.insert(name.to_string(), value);
        Ok(())
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn show_popup(&mut self, at: [f64; 2], html: &str) {
        self.popup = Some(PopupSnapshot {
            at,
            html: html.to_string(),
        });
    }

    fn remove_popup(&mut self) {
        self.popup = None;
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32) {
        self.camera = Some(CameraFit { bounds, padding });
    }
}
