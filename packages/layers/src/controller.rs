//! Surface startup sequencing and ownership.
//!
//! [`MapController`] owns the rendering surface for its whole life. It
//! walks the readiness states `Uninitialized → RawLoaded → StyleReady`:
//!
//! - On the surface load signal the zip boundary base layers are
//!   registered and the camera is fitted to the service area.
//! - If the style already reports loaded the controller is ready at once;
//!   otherwise it waits for the first style-data signal and ignores the
//!   rest.
//!
//! Overlay layers may only be touched at `StyleReady`; reconcilers reach
//! the surface through the crate-private [`MapController::ready_surface`],
//! which is `None` before then. [`MapController::teardown`] resets the
//! state before handing the surface back for disposal, and bumps the
//! generation so a style wait started earlier can no longer complete.

use geojson::{Feature, FeatureCollection};
use serde_json::json;
use strum_macros::{AsRefStr, Display};

use crate::surface::{Bounds, Cursor, LayerSpec, LayerType, RenderSurface, SurfaceEvent};
use crate::{LayerError, ZIP_PROPERTY};

pub const ZIP_SOURCE_ID: &str = "zip-boundaries";
pub const ZIP_FILL_LAYER_ID: &str = "zip-fills";
pub const ZIP_BORDER_LAYER_ID: &str = "zip-borders";
pub const ZIP_LABEL_LAYER_ID: &str = "zip-labels";

pub const ZIP_FILL_COLOR: &str = "#3498db";
pub const ZIP_FILL_OPACITY: f64 = 0.3;

/// Service area the camera is fitted to on load.
pub const SERVICE_AREA_BOUNDS: Bounds = Bounds {
    south_west: [-74.0, 39.7],
    north_east: [-73.8, 40.2],
};

pub const FIT_PADDING: u32 = 20;

/// Readiness of the surface for overlay mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum ReadinessState {
    Uninitialized,
    RawLoaded,
    StyleReady,
}

/// Something the caller should react to after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum MapInteraction {
    /// The surface just became ready for overlays.
    Ready,
    /// A zip region was clicked.
    ZipSelected(String),
    /// The pointer entered a feature of an overlay layer.
    PointerEnter { layer: String, feature: Feature },
    /// The pointer left an overlay layer.
    PointerLeave { layer: String },
}

/// Owns a rendering surface and gates access to it.
#[derive(Debug)]
pub struct MapController<S: RenderSurface> {
    surface: Option<S>,
    state: ReadinessState,
    generation: u64,
    style_wait: Option<u64>,
    zip_boundaries: FeatureCollection,
    popup_open: bool,
    selected_zip: Option<String>,
}

impl<S: RenderSurface> MapController<S> {
    /// Takes ownership of a freshly created surface.
    #[must_use]
    pub const fn new(surface: S, zip_boundaries: FeatureCollection) -> Self {
        Self {
            surface: Some(surface),
            state: ReadinessState::Uninitialized,
            generation: 0,
            style_wait: None,
            zip_boundaries,
            popup_open: false,
            selected_zip: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ReadinessState {
        self.state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ReadinessState::StyleReady && self.surface.is_some()
    }

    /// Whether a style-data wait is outstanding.
    #[must_use]
    pub const fn is_awaiting_style(&self) -> bool {
        self.style_wait.is_some()
    }

    /// Read access to the surface, whatever the state.
    #[must_use]
    pub const fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Geography of the last clicked zip region.
    #[must_use]
    pub fn selected_zip(&self) -> Option<&str> {
        self.selected_zip.as_deref()
    }

    /// Mutable surface access, only once overlays are allowed.
    pub(crate) fn ready_surface(&mut self) -> Option<&mut S> {
        if self.state == ReadinessState::StyleReady {
            self.surface.as_mut()
        } else {
            None
        }
    }

    /// Feeds one surface signal through the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if registering the base layers fails.
    pub fn handle_event(
        &mut self,
        event: &SurfaceEvent,
    ) -> Result<Option<MapInteraction>, LayerError> {
        if self.surface.is_none() {
            log::debug!("Ignoring {event:?} after teardown");
            return Ok(None);
        }

        match event {
            SurfaceEvent::Load => self.on_load(),
            SurfaceEvent::StyleData => Ok(self.on_style_data()),
            SurfaceEvent::Click { layer, feature } if layer == ZIP_FILL_LAYER_ID => {
                Ok(self.on_zip_click(feature))
            }
            SurfaceEvent::Click { .. } => Ok(None),
            SurfaceEvent::PointerEnter { layer, feature } => {
                Ok(self.is_ready().then(|| MapInteraction::PointerEnter {
                    layer: layer.clone(),
                    feature: feature.clone(),
                }))
            }
            SurfaceEvent::PointerLeave { layer } => {
                Ok(self.is_ready().then(|| MapInteraction::PointerLeave {
                    layer: layer.clone(),
                }))
            }
        }
    }

    fn on_load(&mut self) -> Result<Option<MapInteraction>, LayerError> {
        if self.state != ReadinessState::Uninitialized {
            log::debug!("Ignoring repeated load signal in state {}", self.state);
            return Ok(None);
        }
        let Some(surface) = self.surface.as_mut() else {
            return Ok(None);
        };

        register_zip_layers(surface, &self.zip_boundaries)?;
        surface.fit_bounds(SERVICE_AREA_BOUNDS, FIT_PADDING);
        self.state = ReadinessState::RawLoaded;
        log::info!("Map loaded, base layers registered");

        if surface.is_style_loaded() {
            return Ok(Some(self.become_ready()));
        }

        log::debug!("Style not settled yet, waiting for style data");
        self.style_wait = Some(self.generation);
        Ok(None)
    }

    fn on_style_data(&mut self) -> Option<MapInteraction> {
        match self.style_wait {
            Some(generation)
                if generation == self.generation && self.state == ReadinessState::RawLoaded =>
            {
                Some(self.become_ready())
            }
            Some(_) => {
                log::debug!("Dropping stale style wait");
                self.style_wait = None;
                None
            }
            None => None,
        }
    }

    fn become_ready(&mut self) -> MapInteraction {
        self.style_wait = None;
        self.state = ReadinessState::StyleReady;
        log::info!("Map style ready");
        MapInteraction::Ready
    }

    fn on_zip_click(&mut self, feature: &Feature) -> Option<MapInteraction> {
        let zip = feature
            .property(ZIP_PROPERTY)
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|z| !z.is_empty())?;

        self.hide_popup();
        log::debug!("Selected zip {zip}");
        self.selected_zip = Some(zip.clone());
        Some(MapInteraction::ZipSelected(zip))
    }

    /// Shows the shared popup, moving it if it is already open.
    pub(crate) fn show_popup(&mut self, at: [f64; 2], html: &str) {
        if let Some(surface) = self.ready_surface() {
            surface.show_popup(at, html);
            surface.set_cursor(Cursor::Pointer);
            self.popup_open = true;
        }
    }

    /// Hides the shared popup and resets the cursor.
    pub(crate) fn hide_popup(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            if self.popup_open {
                surface.remove_popup();
            }
            surface.set_cursor(Cursor::Default);
        }
        self.popup_open = false;
    }

    #[must_use]
    pub const fn is_popup_open(&self) -> bool {
        self.popup_open
    }

    /// Resets to `Uninitialized` and hands the surface back for disposal.
    ///
    /// Any pending style wait is cancelled. Calling this twice returns
    /// `None` the second time.
    pub fn teardown(&mut self) -> Option<S> {
        self.state = ReadinessState::Uninitialized;
        self.generation += 1;
        self.style_wait = None;
        self.selected_zip = None;
        if self.popup_open {
            if let Some(surface) = self.surface.as_mut() {
                surface.remove_popup();
                surface.set_cursor(Cursor::Default);
            }
            self.popup_open = false;
        }
        log::debug!("Map controller torn down (generation {})", self.generation);
        self.surface.take()
    }

    /// Attaches a new surface after [`Self::teardown`], starting over from
    /// `Uninitialized`.
    pub fn remount(&mut self, surface: S) {
        self.teardown();
        self.surface = Some(surface);
    }
}

/// Adds the zip boundary source and its fill, border, and label layers,
/// skipping any that already exist.
fn register_zip_layers<S: RenderSurface>(
    surface: &mut S,
    zip_boundaries: &FeatureCollection,
) -> Result<(), LayerError> {
    if !surface.has_source(ZIP_SOURCE_ID) {
        surface
            .add_source(ZIP_SOURCE_ID, zip_boundaries)
            .map_err(|e| LayerError::surface("add source", ZIP_SOURCE_ID, e))?;
    }

    let layers = [
        LayerSpec::new(ZIP_FILL_LAYER_ID, LayerType::Fill, ZIP_SOURCE_ID)
            .paint("fill-color", json!(ZIP_FILL_COLOR))
            .paint("fill-opacity", json!(ZIP_FILL_OPACITY)),
        LayerSpec::new(ZIP_BORDER_LAYER_ID, LayerType::Line, ZIP_SOURCE_ID)
            .paint("line-color", json!("#2c3e50"))
            .paint("line-width", json!(1)),
        LayerSpec::new(ZIP_LABEL_LAYER_ID, LayerType::Symbol, ZIP_SOURCE_ID)
            .layout("text-field", json!(["get", ZIP_PROPERTY]))
            .layout("text-font", json!(["Open Sans Bold", "Arial Unicode MS Bold"]))
            .layout("text-size", json!(10))
            .layout("text-allow-overlap", json!(false))
            .paint("text-color", json!("#333"))
            .paint("text-halo-color", json!("rgba(255,255,255,0.8)"))
            .paint("text-halo-width", json!(1)),
    ];

    for layer in &layers {
        if !surface.has_layer(&layer.id) {
            surface
                .add_layer(layer)
                .map_err(|e| LayerError::surface("add layer", &layer.id, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleDocument;
    use crate::test_support::{empty_collection, point_feature, zip_feature};

    fn controller(doc: StyleDocument) -> MapController<StyleDocument> {
        MapController::new(doc, empty_collection())
    }

    #[test]
    fn starts_uninitialized_without_surface_access() {
        let mut map = controller(StyleDocument::new());
        assert_eq!(map.state(), ReadinessState::Uninitialized);
        assert!(map.ready_surface().is_none());
    }

    #[test]
    fn load_with_settled_style_is_ready_immediately() {
        let mut map = controller(StyleDocument::new());
        let out = map.handle_event(&SurfaceEvent::Load).unwrap();
        assert_eq!(out, Some(MapInteraction::Ready));
        assert_eq!(map.state(), ReadinessState::StyleReady);
        assert!(!map.is_awaiting_style());
    }

    #[test]
    fn load_registers_base_layers_and_fits_camera() {
        let mut map = controller(StyleDocument::new());
        map.handle_event(&SurfaceEvent::Load).unwrap();

        let doc = map.surface().unwrap();
        assert!(doc.has_source(ZIP_SOURCE_ID));
        let ids: Vec<&str> = doc.layer_ids().collect();
        assert_eq!(ids, [ZIP_FILL_LAYER_ID, ZIP_BORDER_LAYER_ID, ZIP_LABEL_LAYER_ID]);
        let camera = doc.camera().unwrap();
        assert_eq!(camera.bounds, SERVICE_AREA_BOUNDS);
        assert_eq!(camera.padding, 20);
    }

    #[test]
    fn unsettled_style_waits_for_first_style_data() {
        let mut map = controller(StyleDocument::loading());
        assert_eq!(map.handle_event(&SurfaceEvent::Load).unwrap(), None);
        assert_eq!(map.state(), ReadinessState::RawLoaded);
        assert!(map.is_awaiting_style());
        assert!(map.ready_surface().is_none());

        let out = map.handle_event(&SurfaceEvent::StyleData).unwrap();
        assert_eq!(out, Some(MapInteraction::Ready));
        assert_eq!(map.state(), ReadinessState::StyleReady);

        // One-shot: later style data is ignored.
        assert_eq!(map.handle_event(&SurfaceEvent::StyleData).unwrap(), None);
    }

    #[test]
    fn style_data_before_load_is_ignored() {
        let mut map = controller(StyleDocument::loading());
        assert_eq!(map.handle_event(&SurfaceEvent::StyleData).unwrap(), None);
        assert_eq!(map.state(), ReadinessState::Uninitialized);
    }

    #[test]
    fn repeated_load_is_ignored() {
        let mut map = controller(StyleDocument::new());
        map.handle_event(&SurfaceEvent::Load).unwrap();
        assert_eq!(map.handle_event(&SurfaceEvent::Load).unwrap(), None);
        assert_eq!(map.surface().unwrap().layer_ids().count(), 3);
    }

    #[test]
    fn teardown_cancels_pending_style_wait() {
        let mut map = controller(StyleDocument::loading());
        map.handle_event(&SurfaceEvent::Load).unwrap();

        let doc = map.teardown();
        assert!(doc.is_some());
        assert_eq!(map.state(), ReadinessState::Uninitialized);
        assert!(!map.is_awaiting_style());

        // A late style-data callback does nothing.
        assert_eq!(map.handle_event(&SurfaceEvent::StyleData).unwrap(), None);
        assert_eq!(map.state(), ReadinessState::Uninitialized);
        assert!(map.teardown().is_none());
    }

    #[test]
    fn remount_starts_over() {
        let mut map = controller(StyleDocument::loading());
        map.handle_event(&SurfaceEvent::Load).unwrap();
        map.remount(StyleDocument::loading());

        assert_eq!(map.handle_event(&SurfaceEvent::StyleData).unwrap(), None);
        assert_eq!(map.state(), ReadinessState::Uninitialized);

        map.handle_event(&SurfaceEvent::Load).unwrap();
        assert_eq!(
            map.handle_event(&SurfaceEvent::StyleData).unwrap(),
            Some(MapInteraction::Ready)
        );
    }

    #[test]
    fn zip_click_selects_and_hides_popup() {
        let mut map = controller(StyleDocument::new());
        map.handle_event(&SurfaceEvent::Load).unwrap();
        map.show_popup([-74.0, 40.0], "<p>x</p>");
        assert!(map.is_popup_open());

        let out = map
            .handle_event(&SurfaceEvent::Click {
                layer: ZIP_FILL_LAYER_ID.to_string(),
                feature: zip_feature("07719"),
            })
            .unwrap();

        assert_eq!(out, Some(MapInteraction::ZipSelected("07719".to_string())));
        assert_eq!(map.selected_zip(), Some("07719"));
        assert!(!map.is_popup_open());
        assert!(map.surface().unwrap().popup().is_none());
    }

    #[test]
    fn clicks_on_other_layers_are_ignored() {
        let mut map = controller(StyleDocument::new());
        map.handle_event(&SurfaceEvent::Load).unwrap();
        let out = map
            .handle_event(&SurfaceEvent::Click {
                layer: "locations-points".to_string(),
                feature: point_feature(-74.0, 40.0),
            })
            .unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn pointer_events_only_surface_when_ready() {
        let mut map = controller(StyleDocument::loading());
        let enter = SurfaceEvent::PointerEnter {
            layer: "locations-points".to_string(),
            feature: point_feature(-74.0, 40.0),
        };
        assert_eq!(map.handle_event(&enter).unwrap(), None);

        map.handle_event(&SurfaceEvent::Load).unwrap();
        map.handle_event(&SurfaceEvent::StyleData).unwrap();
        assert!(matches!(
            map.handle_event(&enter).unwrap(),
            Some(MapInteraction::PointerEnter { .. })
        ));
    }
}
