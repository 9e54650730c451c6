//! The map view: controller plus every overlay reconciler.

use food_map_analytics::NeedScores;
use food_map_records_models::{Location, Supplier};
use geojson::FeatureCollection;

use crate::LayerError;
use crate::choropleth::ChoroplethReconciler;
use crate::controller::{MapController, MapInteraction};
use crate::filter::CategoryFilter;
use crate::projector::project;
use crate::reconciler::{LayerReconciler, LayerStyle, ReconcileOutcome};
use crate::surface::{RenderSurface, SurfaceEvent};

/// Drives one surface: readiness, location and supplier overlays, the
/// need choropleth, and hover routing.
#[derive(Debug)]
pub struct MapView<S: RenderSurface> {
    controller: MapController<S>,
    locations: LayerReconciler,
    suppliers: LayerReconciler,
    choropleth: ChoroplethReconciler,
}

impl<S: RenderSurface> MapView<S> {
    #[must_use]
    pub const fn new(surface: S, zip_boundaries: FeatureCollection) -> Self {
        Self {
            controller: MapController::new(surface, zip_boundaries),
            locations: LayerReconciler::new(LayerStyle::locations()),
            suppliers: LayerReconciler::new(LayerStyle::suppliers()),
            choropleth: ChoroplethReconciler::new(),
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &MapController<S> {
        &self.controller
    }

    #[must_use]
    pub const fn locations(&self) -> &LayerReconciler {
        &self.locations
    }

    #[must_use]
    pub const fn suppliers(&self) -> &LayerReconciler {
        &self.suppliers
    }

    /// Handles a surface signal, routing hover events to the overlay that
    /// owns the layer. Returns the geography of a clicked zip region.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if base layer registration fails.
    pub fn handle_event(&mut self, event: &SurfaceEvent) -> Result<Option<String>, LayerError> {
        match self.controller.handle_event(event)? {
            Some(MapInteraction::ZipSelected(zip)) => return Ok(Some(zip)),
            Some(MapInteraction::PointerEnter { layer, feature }) => {
                if let Some(overlay) = self.overlay_for(&layer) {
                    overlay.on_pointer_enter(&mut self.controller, &feature);
                }
            }
            Some(MapInteraction::PointerLeave { layer }) => {
                if let Some(overlay) = self.overlay_for(&layer) {
                    overlay.on_pointer_leave(&mut self.controller);
                }
            }
            Some(MapInteraction::Ready) | None => {}
        }
        Ok(None)
    }

    fn overlay_for(&self, layer: &str) -> Option<LayerReconciler> {
        [&self.locations, &self.suppliers]
            .into_iter()
            .find(|r| r.owns_layer(layer))
            .cloned()
    }

    /// Filters, projects, and reconciles the location overlay.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the surface rejects an operation.
    pub fn show_locations(
        &mut self,
        records: &[Location],
        filter: &CategoryFilter,
        visible: bool,
    ) -> Result<ReconcileOutcome, LayerError> {
        let data = project(filter.apply(records));
        self.locations
            .reconcile(&mut self.controller, &data, visible)
    }

    /// Projects and reconciles the supplier overlay.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the surface rejects an operation.
    pub fn show_suppliers(
        &mut self,
        records: &[Supplier],
        visible: bool,
    ) -> Result<ReconcileOutcome, LayerError> {
        let data = project(records);
        self.suppliers
            .reconcile(&mut self.controller, &data, visible)
    }

    /// Applies the need encoding, or restores the base zip paint when
    /// `scores` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the surface rejects the paint update.
    pub fn show_need(&mut self, scores: Option<&NeedScores>) -> Result<ReconcileOutcome, LayerError> {
        match scores {
            Some(scores) => self.choropleth.apply(&mut self.controller, scores),
            None => self.choropleth.clear(&mut self.controller),
        }
    }

    /// Tears the view down and returns the surface for disposal.
    pub fn teardown(&mut self) -> Option<S> {
        self.controller.teardown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ZIP_FILL_LAYER_ID;
    use crate::reconciler::{LOCATION_LAYER_ID, LOCATION_SOURCE_ID, SUPPLIER_LAYER_ID};
    use crate::style::StyleDocument;
    use crate::test_support::{empty_collection, point_feature_with, zip_feature};
    use food_map_records_models::Entity;
    use serde_json::json;

    fn location(id: &str, category: &str, coords: Option<(f64, f64)>) -> Location {
        let mut raw = json!({ "_id": id, "Name": id, "Category": category });
        if let Some((lat, lon)) = coords {
            raw["latitude"] = json!(lat);
            raw["longitude"] = json!(lon);
        }
        Location::from_raw(&raw).unwrap()
    }

    #[test]
    fn overlays_wait_for_style_then_apply() {
        let mut view = MapView::new(StyleDocument::loading(), empty_collection());
        let records = vec![location("a", "Garden", Some((40.0, -74.0)))];

        view.handle_event(&SurfaceEvent::Load).unwrap();
        assert_eq!(
            view.show_locations(&records, &CategoryFilter::new(), true)
                .unwrap(),
            ReconcileOutcome::Skipped
        );

        view.handle_event(&SurfaceEvent::StyleData).unwrap();
        assert_eq!(
            view.show_locations(&records, &CategoryFilter::new(), true)
                .unwrap(),
            ReconcileOutcome::Created
        );
    }

    #[test]
    fn filter_and_location_drop_happen_before_projection() {
        let mut view = MapView::new(StyleDocument::new(), empty_collection());
        view.handle_event(&SurfaceEvent::Load).unwrap();
        let records = vec![
            location("a", "Garden", Some((40.0, -74.0))),
            location("b", "Shelter", Some((40.1, -74.1))),
            location("c", "Garden", None),
        ];

        view.show_locations(&records, &CategoryFilter::only(["Garden"]), true)
            .unwrap();
        let doc = view.controller().surface().unwrap();
        assert_eq!(doc.source_data(LOCATION_SOURCE_ID).unwrap().features.len(), 1);

        // Filtering everything out tears the overlay down.
        view.show_locations(&records, &CategoryFilter::only(["Backpack"]), true)
            .unwrap();
        let doc = view.controller().surface().unwrap();
        assert!(!doc.has_layer(LOCATION_LAYER_ID));
        assert!(!doc.has_source(LOCATION_SOURCE_ID));
    }

    #[test]
    fn hover_is_routed_to_owning_overlay() {
        let mut view = MapView::new(StyleDocument::new(), empty_collection());
        view.handle_event(&SurfaceEvent::Load).unwrap();

        view.handle_event(&SurfaceEvent::PointerEnter {
            layer: SUPPLIER_LAYER_ID.to_string(),
            feature: point_feature_with(-74.0, 40.0, json!({ "Identifier": "Farm" })),
        })
        .unwrap();
        let popup = view.controller().surface().unwrap().popup().unwrap();
        assert!(popup.html.contains("supplier-popup"));

        view.handle_event(&SurfaceEvent::PointerLeave {
            layer: SUPPLIER_LAYER_ID.to_string(),
        })
        .unwrap();
        assert!(view.controller().surface().unwrap().popup().is_none());
    }

    #[test]
    fn zip_click_is_returned() {
        let mut view = MapView::new(StyleDocument::new(), empty_collection());
        view.handle_event(&SurfaceEvent::Load).unwrap();
        let zip = view
            .handle_event(&SurfaceEvent::Click {
                layer: ZIP_FILL_LAYER_ID.to_string(),
                feature: zip_feature("08701"),
            })
            .unwrap();
        assert_eq!(zip.as_deref(), Some("08701"));
    }

    #[test]
    fn need_mode_toggles_zip_paint() {
        let mut view = MapView::new(StyleDocument::new(), empty_collection());
        view.handle_event(&SurfaceEvent::Load).unwrap();
        let scores = NeedScores::from_regions(&[food_map_records_models::ZipRegion::new("08701")]);

        view.show_need(Some(&scores)).unwrap();
        view.show_need(None).unwrap();
        let fill = view
            .controller()
            .surface()
            .unwrap()
            .layer(ZIP_FILL_LAYER_ID)
            .unwrap();
        assert_eq!(fill.paint["fill-color"], json!("#3498db"));
    }

    #[test]
    fn teardown_hands_back_surface_once() {
        let mut view = MapView::new(StyleDocument::new(), empty_collection());
        view.handle_event(&SurfaceEvent::Load).unwrap();
        assert!(view.teardown().is_some());
        assert!(view.teardown().is_none());
        assert_eq!(
            view.show_suppliers(&[], true).unwrap(),
            ReconcileOutcome::Skipped
        );
    }
}
