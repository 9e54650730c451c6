//! Lifecycle of one GeoJSON source and the point layer drawn from it.
//!
//! A [`LayerReconciler`] brings the surface in line with the latest
//! feature collection: it creates the source and layer on first data,
//! replaces the data wholesale afterwards, removes both when the data
//! goes empty, and applies visibility. Every operation is idempotent and
//! does nothing until the map is ready.

use food_map_records_models::{DEFAULT_CATEGORY, LocationCategory};
use geojson::{Feature, FeatureCollection};
use serde::Serialize;
use serde_json::{Value, json};

use crate::controller::MapController;
use crate::popup::{PopupRenderer, location_popup, supplier_popup};
use crate::surface::{LayerSpec, LayerType, RenderSurface, Visibility, point_of};
use crate::LayerError;

pub const LOCATION_SOURCE_ID: &str = "locations";
pub const LOCATION_LAYER_ID: &str = "locations-points";
pub const SUPPLIER_SOURCE_ID: &str = "suppliers";
pub const SUPPLIER_LAYER_ID: &str = "suppliers-points";

/// How a point layer picks its fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRule {
    /// One color for every point.
    Constant(&'static str),
    /// Category table lookup on a feature property, default color for
    /// anything unlisted.
    MatchCategory { property: &'static str },
}

impl ColorRule {
    /// The rule as a style expression.
    #[must_use]
    pub fn expression(self) -> Value {
        match self {
            Self::Constant(color) => json!(color),
            Self::MatchCategory { property } => {
                let mut expr = vec![json!("match"), json!(["get", property])];
                for category in LocationCategory::named() {
                    expr.push(json!(category.to_string()));
                    expr.push(json!(category.color()));
                }
                expr.push(json!(LocationCategory::Default.color()));
                Value::Array(expr)
            }
        }
    }
}

/// Fixed paint of a circle layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPaint {
    pub radius: f64,
    pub color: ColorRule,
    pub stroke_width: f64,
    pub stroke_color: &'static str,
}

impl PointPaint {
    #[must_use]
    pub fn layer_spec(&self, layer_id: &str, source_id: &str) -> LayerSpec {
        LayerSpec::new(layer_id, LayerType::Circle, source_id)
            .paint("circle-radius", json!(self.radius))
            .paint("circle-color", self.color.expression())
            .paint("circle-stroke-width", json!(self.stroke_width))
            .paint("circle-stroke-color", json!(self.stroke_color))
    }
}

/// Everything that distinguishes one point overlay from another.
#[derive(Debug, Clone, Copy)]
pub struct LayerStyle {
    pub source_id: &'static str,
    pub layer_id: &'static str,
    pub paint: PointPaint,
    pub popup: PopupRenderer,
}

impl LayerStyle {
    /// Service locations, colored by category.
    #[must_use]
    pub const fn locations() -> Self {
        Self {
            source_id: LOCATION_SOURCE_ID,
            layer_id: LOCATION_LAYER_ID,
            paint: PointPaint {
                radius: 6.0,
                color: ColorRule::MatchCategory {
                    property: "Category",
                },
                stroke_width: 1.0,
                stroke_color: "#ffffff",
            },
            popup: location_popup,
        }
    }

    /// Suppliers, one color.
    #[must_use]
    pub const fn suppliers() -> Self {
        Self {
            source_id: SUPPLIER_SOURCE_ID,
            layer_id: SUPPLIER_LAYER_ID,
            paint: PointPaint {
                radius: 5.0,
                color: ColorRule::Constant("#34495e"),
                stroke_width: 1.0,
                stroke_color: "#ffffff",
            },
            popup: supplier_popup,
        }
    }

    #[must_use]
    pub fn layer_spec(&self) -> LayerSpec {
        self.paint.layer_spec(self.layer_id, self.source_id)
    }
}

/// What the reconciler last observed and applied on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayerState {
    pub source_exists: bool,
    pub layer_exists: bool,
    pub visibility: Option<Visibility>,
}

/// Result of one reconcile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The map is not ready; nothing was touched.
    Skipped,
    /// Source and layer were added.
    Created,
    /// Source data was replaced.
    Updated,
    /// The layer and source were removed.
    Removed,
    /// Nothing to do.
    Unchanged,
}

/// Keeps one source/layer pair in sync with its data.
#[derive(Debug, Clone)]
pub struct LayerReconciler {
    style: LayerStyle,
    state: LayerState,
}

impl LayerReconciler {
    #[must_use]
    pub const fn new(style: LayerStyle) -> Self {
        Self {
            style,
            state: LayerState {
                source_exists: false,
                layer_exists: false,
                visibility: None,
            },
        }
    }

    #[must_use]
    pub const fn style(&self) -> &LayerStyle {
        &self.style
    }

    #[must_use]
    pub const fn state(&self) -> LayerState {
        self.state
    }

    /// Whether events for `layer` belong to this reconciler.
    #[must_use]
    pub fn owns_layer(&self, layer: &str) -> bool {
        self.style.layer_id == layer
    }

    /// Applies `data` and `visible` to the surface.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the surface rejects an operation.
    pub fn reconcile<S: RenderSurface>(
        &mut self,
        map: &mut MapController<S>,
        data: &FeatureCollection,
        visible: bool,
    ) -> Result<ReconcileOutcome, LayerError> {
        let style = self.style;
        let Some(surface) = map.ready_surface() else {
            log::debug!("Map not ready, skipping reconcile of {}", style.layer_id);
            return Ok(ReconcileOutcome::Skipped);
        };
        self.observe(surface);

        if data.features.is_empty() {
            return self.remove(surface);
        }

        let outcome = if self.state.source_exists {
            surface
                .set_source_data(style.source_id, data)
                .map_err(|e| LayerError::surface("set data", style.source_id, e))?;
            ReconcileOutcome::Updated
        } else {
            surface
                .add_source(style.source_id, data)
                .map_err(|e| LayerError::surface("add source", style.source_id, e))?;
            self.state.source_exists = true;
            ReconcileOutcome::Created
        };

        if !self.state.layer_exists {
            self.add_layer(surface)?;
        }
        self.apply_visibility(surface, visible)?;

        log::debug!(
            "{:?} {} with {} features",
            outcome,
            style.layer_id,
            data.features.len()
        );
        Ok(outcome)
    }

    /// Shows or hides the layer without touching its source. A missing
    /// layer is recreated first if its source exists.
    ///
    /// Returns whether visibility was applied.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the surface rejects an operation.
    pub fn set_visibility<S: RenderSurface>(
        &mut self,
        map: &mut MapController<S>,
        visible: bool,
    ) -> Result<bool, LayerError> {
        let Some(surface) = map.ready_surface() else {
            return Ok(false);
        };
        self.observe(surface);

        if !self.state.layer_exists {
            if !self.state.source_exists {
                log::debug!("No {} source yet, visibility deferred", self.style.source_id);
                return Ok(false);
            }
            self.add_layer(surface)?;
        }
        self.apply_visibility(surface, visible)?;
        Ok(true)
    }

    /// Shows the shared popup for a hovered feature.
    pub fn on_pointer_enter<S: RenderSurface>(
        &self,
        map: &mut MapController<S>,
        feature: &Feature,
    ) {
        let Some(at) = point_of(feature) else {
            log::debug!("Hovered {} feature has no point geometry", self.style.layer_id);
            return;
        };
        let html = feature
            .properties
            .as_ref()
            .map_or_else(String::new, |props| (self.style.popup)(props));
        map.show_popup(at, &html);
    }

    /// Hides the shared popup.
    pub fn on_pointer_leave<S: RenderSurface>(&self, map: &mut MapController<S>) {
        map.hide_popup();
    }

    fn observe<S: RenderSurface>(&mut self, surface: &S) {
        self.state.source_exists = surface.has_source(self.style.source_id);
        self.state.layer_exists = surface.has_layer(self.style.layer_id);
        if !self.state.layer_exists {
            self.state.visibility = None;
        }
    }

    fn remove<S: RenderSurface>(&mut self, surface: &mut S) -> Result<ReconcileOutcome, LayerError> {
        let style = self.style;
        if !self.state.layer_exists && !self.state.source_exists {
            return Ok(ReconcileOutcome::Unchanged);
        }
        if self.state.layer_exists {
            surface
                .remove_layer(style.layer_id)
                .map_err(|e| LayerError::surface("remove layer", style.layer_id, e))?;
            self.state.layer_exists = false;
            self.state.visibility = None;
        }
        if self.state.source_exists {
            surface
                .remove_source(style.source_id)
                .map_err(|e| LayerError::surface("remove source", style.source_id, e))?;
            self.state.source_exists = false;
        }
        log::debug!("Removed {} (no data)", style.layer_id);
        Ok(ReconcileOutcome::Removed)
    }

    fn add_layer<S: RenderSurface>(&mut self, surface: &mut S) -> Result<(), LayerError> {
        surface
            .add_layer(&self.style.layer_spec())
            .map_err(|e| LayerError::surface("add layer", self.style.layer_id, e))?;
        self.state.layer_exists = true;
        Ok(())
    }

    fn apply_visibility<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        visible: bool,
    ) -> Result<(), LayerError> {
        let visibility = Visibility::from(visible);
        surface
            .set_visibility(self.style.layer_id, visibility)
            .map_err(|e| LayerError::surface("set visibility", self.style.layer_id, e))?;
        self.state.visibility = Some(visibility);
        Ok(())
    }
}

/// The category color table as legend entries, default last.
#[must_use]
pub fn legend() -> Vec<(String, &'static str)> {
    LocationCategory::named()
        .iter()
        .map(|c| (c.to_string(), c.color()))
        .chain(std::iter::once((
            DEFAULT_CATEGORY.to_string(),
            LocationCategory::Default.color(),
        )))
        .collect()
}
