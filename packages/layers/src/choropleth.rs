//! Need-score encoding on the zip fill layer.

use food_map_analytics::{FillEncoding, NeedScores};
use serde_json::{Value, json};

use crate::controller::{MapController, ZIP_FILL_COLOR, ZIP_FILL_LAYER_ID, ZIP_FILL_OPACITY};
use crate::reconciler::ReconcileOutcome;
use crate::surface::RenderSurface;
use crate::{LayerError, ZIP_PROPERTY};

/// Builds `["match", ["get", ZCTA5CE10], zip, value, …, fallback]`, or the
/// bare fallback when there are no entries.
fn match_expression<I>(entries: I, fallback: Value) -> Value
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut expr = vec![json!("match"), json!(["get", ZIP_PROPERTY])];
    for (zip, value) in entries {
        expr.push(Value::String(zip));
        expr.push(value);
    }
    if expr.len() == 2 {
        return fallback;
    }
    expr.push(fallback);
    Value::Array(expr)
}

/// `fill-color` and `fill-opacity` expressions for a score map.
#[must_use]
pub fn choropleth_paint(scores: &NeedScores) -> (Value, Value) {
    let fallback = FillEncoding::fallback();
    let encodings: Vec<(String, FillEncoding)> = scores
        .encodings()
        .map(|(zip, enc)| (zip.to_string(), enc))
        .collect();

    let color = match_expression(
        encodings
            .iter()
            .map(|(zip, enc)| (zip.clone(), json!(enc.color))),
        json!(fallback.color),
    );
    let opacity = match_expression(
        encodings
            .iter()
            .map(|(zip, enc)| (zip.clone(), json!(enc.opacity))),
        json!(fallback.opacity),
    );
    (color, opacity)
}

/// Switches the zip fill layer between its base paint and the need
/// encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoroplethReconciler {
    applied: bool,
}

impl ChoroplethReconciler {
    #[must_use]
    pub const fn new() -> Self {
        Self { applied: false }
    }

    #[must_use]
    pub const fn is_applied(&self) -> bool {
        self.applied
    }

    /// Paints the zip fills by need score.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the surface rejects the paint update.
    pub fn apply<S: RenderSurface>(
        &mut self,
        map: &mut MapController<S>,
        scores: &NeedScores,
    ) -> Result<ReconcileOutcome, LayerError> {
        let Some(surface) = map.ready_surface() else {
            return Ok(ReconcileOutcome::Skipped);
        };
        if !surface.has_layer(ZIP_FILL_LAYER_ID) {
            log::warn!("No {ZIP_FILL_LAYER_ID} layer, cannot apply need encoding");
            return Ok(ReconcileOutcome::Skipped);
        }

        let (color, opacity) = choropleth_paint(scores);
        set_fill(surface, color, opacity)?;
        self.applied = true;
        log::debug!("Applied need encoding to {} zip regions", scores.len());
        Ok(ReconcileOutcome::Updated)
    }

    /// Restores the base zip fill paint.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError`] if the surface rejects the paint update.
    pub fn clear<S: RenderSurface>(
        &mut self,
        map: &mut MapController<S>,
    ) -> Result<ReconcileOutcome, LayerError> {
        if !self.applied {
            return Ok(ReconcileOutcome::Unchanged);
        }
        let Some(surface) = map.ready_surface() else {
            return Ok(ReconcileOutcome::Skipped);
        };
        if surface.has_layer(ZIP_FILL_LAYER_ID) {
            set_fill(surface, json!(ZIP_FILL_COLOR), json!(ZIP_FILL_OPACITY))?;
        }
        self.applied = false;
        Ok(ReconcileOutcome::Updated)
    }
}

fn set_fill<S: RenderSurface>(surface: &mut S, color: Value, opacity: Value) -> Result<(), LayerError> {
    surface
        .set_paint_property(ZIP_FILL_LAYER_ID, "fill-color", color)
        .map_err(|e| LayerError::surface("set paint", ZIP_FILL_LAYER_ID, e))?;
    surface
        .set_paint_property(ZIP_FILL_LAYER_ID, "fill-opacity", opacity)
        .map_err(|e| LayerError::surface("set paint", ZIP_FILL_LAYER_ID, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleDocument;
    use crate::surface::SurfaceEvent;
    use crate::test_support::empty_collection;
    use food_map_records_models::ZipRegion;

    fn scores() -> NeedScores {
        let mut a = ZipRegion::new("07719");
        a.food_insecurity_rate = Some(0.3);
        a.poverty_rate = Some(0.2);
        a.unemployment_rate = Some(0.1);
        a.population = Some(50_000.0);
        NeedScores::from_regions(&[a, ZipRegion::new("07720")])
    }

    fn ready_map() -> MapController<StyleDocument> {
        let mut map = MapController::new(StyleDocument::new(), empty_collection());
        map.handle_event(&SurfaceEvent::Load).unwrap();
        map
    }

    #[test]
    fn paint_is_a_match_on_zip_with_fallback() {
        let (color, opacity) = choropleth_paint(&scores());
        assert_eq!(
            color,
            json!(["match", ["get", "ZCTA5CE10"], "07719", "#08519c", "07720", "#eff3ff", "#cccccc"])
        );
        let opacity = opacity.as_array().unwrap();
        assert!((opacity[3].as_f64().unwrap() - 0.85).abs() < 1e-12);
        assert_eq!(opacity.last().unwrap(), &json!(0.05));
    }

    #[test]
    fn empty_scores_paint_the_fallback() {
        let (color, opacity) = choropleth_paint(&NeedScores::default());
        assert_eq!(color, json!("#cccccc"));
        assert_eq!(opacity, json!(0.05));
    }

    #[test]
    fn apply_then_clear_restores_base_paint() {
        let mut map = ready_map();
        let mut choropleth = ChoroplethReconciler::new();

        assert_eq!(
            choropleth.apply(&mut map, &scores()).unwrap(),
            ReconcileOutcome::Updated
        );
        let fill = map.surface().unwrap().layer(ZIP_FILL_LAYER_ID).unwrap();
        assert!(fill.paint["fill-color"].is_array());
        assert!(choropleth.is_applied());

        choropleth.clear(&mut map).unwrap();
        let fill = map.surface().unwrap().layer(ZIP_FILL_LAYER_ID).unwrap();
        assert_eq!(fill.paint["fill-color"], json!("#3498db"));
        assert_eq!(fill.paint["fill-opacity"], json!(0.3));
        assert_eq!(choropleth.clear(&mut map).unwrap(), ReconcileOutcome::Unchanged);
    }

    #[test]
    fn apply_waits_for_ready() {
        let mut map = MapController::new(StyleDocument::loading(), empty_collection());
        let mut choropleth = ChoroplethReconciler::new();
        assert_eq!(
            choropleth.apply(&mut map, &scores()).unwrap(),
            ReconcileOutcome::Skipped
        );
        assert!(!choropleth.is_applied());
    }
}
