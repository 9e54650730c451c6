//! The fetch, locate, filter, and project pipeline behind each endpoint.

use food_map_analytics::NeedScores;
use food_map_geocoder::Geocoder;
use food_map_layers::{CategoryFilter, MapView, StyleDocument, SurfaceEvent, project};
use food_map_locate::progress::NullProgress;
use food_map_locate::{LocateReport, LocatedCollection};
use food_map_records_models::{Locatable, Location, Supplier};
use geojson::FeatureCollection;
use serde_json::Value;

use crate::{AppState, ServerError};

/// Which overlays a style document should carry.
#[derive(Debug, Clone, Default)]
pub struct StyleOptions {
    pub filter: CategoryFilter,
    pub locations: bool,
    pub suppliers: bool,
    pub need: bool,
}

/// Parses a `categories` query value. Absent or blank means every
/// category.
#[must_use]
pub fn category_filter(categories: Option<&str>) -> CategoryFilter {
    categories.map_or_else(CategoryFilter::new, CategoryFilter::parse_list)
}

/// Fetches a collection and geocodes records missing coordinates.
///
/// Coordinate write-backs are left running in the background.
///
/// # Errors
///
/// Returns [`ServerError::Store`] if the collection cannot be fetched.
pub async fn located<T: Locatable>(
    collection: &LocatedCollection<T>,
    geocoder: &dyn Geocoder,
    concurrency: usize,
) -> Result<Vec<T>, ServerError> {
    let LocateReport {
        records,
        write_backs,
        ..
    } = collection
        .fetch_and_locate(geocoder, concurrency, &NullProgress)
        .await?;

    if !write_backs.is_empty() {
        log::debug!(
            "{} {} coordinate write-backs running in background",
            write_backs.len(),
            T::LABEL
        );
    }
    Ok(records)
}

/// Located, filtered location features.
///
/// # Errors
///
/// Returns [`ServerError::Store`] if locations cannot be fetched.
pub async fn location_features(
    state: &AppState,
    filter: &CategoryFilter,
) -> Result<FeatureCollection, ServerError> {
    let records: Vec<Location> =
        located(&state.locations, state.geocoder.as_ref(), state.concurrency).await?;
    Ok(project(filter.apply(&records)))
}

/// Located supplier features.
///
/// # Errors
///
/// Returns [`ServerError::Store`] if suppliers cannot be fetched.
pub async fn supplier_features(state: &AppState) -> Result<FeatureCollection, ServerError> {
    let records: Vec<Supplier> =
        located(&state.suppliers, state.geocoder.as_ref(), state.concurrency).await?;
    Ok(project(&records))
}

/// Need scores for every zip region in the store.
///
/// # Errors
///
/// Returns [`ServerError::Store`] if zip regions cannot be fetched.
pub async fn need_scores(state: &AppState) -> Result<NeedScores, ServerError> {
    let regions = state.zips.get_all().await?;
    Ok(NeedScores::from_regions(&regions))
}

/// Builds a style document with the zip base layers and the requested
/// overlays.
///
/// # Errors
///
/// Returns [`ServerError`] if a collection cannot be fetched or the
/// document rejects a layer operation.
pub async fn style_document(
    state: &AppState,
    options: &StyleOptions,
) -> Result<Value, ServerError> {
    let locations = if options.locations {
        located(&state.locations, state.geocoder.as_ref(), state.concurrency).await?
    } else {
        Vec::new()
    };
    let suppliers = if options.suppliers {
        located(&state.suppliers, state.geocoder.as_ref(), state.concurrency).await?
    } else {
        Vec::new()
    };
    let scores = if options.need {
        Some(need_scores(state).await?)
    } else {
        None
    };

    render_style(
        state.zip_boundaries.clone(),
        &locations,
        &suppliers,
        scores.as_ref(),
        options,
    )
}

/// Drives a fresh map view through load and every overlay, then returns
/// the document it produced.
///
/// # Errors
///
/// Returns [`ServerError`] if the document rejects a layer operation.
pub fn render_style(
    zip_boundaries: FeatureCollection,
    locations: &[Location],
    suppliers: &[Supplier],
    scores: Option<&NeedScores>,
    options: &StyleOptions,
) -> Result<Value, ServerError> {
    let mut view = MapView::new(StyleDocument::new(), zip_boundaries);
    view.handle_event(&SurfaceEvent::Load)?;

    view.show_locations(locations, &options.filter, options.locations)?;
    view.show_suppliers(suppliers, options.suppliers)?;
    view.show_need(scores)?;

    let document = view.teardown().ok_or(ServerError::SurfaceUnavailable)?;
    Ok(document.to_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use food_map_records_models::{Entity, ZipRegion};
    use food_map_layers::empty_collection;
    use serde_json::json;

    fn layer_ids(style: &Value) -> Vec<&str> {
        style["layers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn blank_categories_mean_every_category() {
        assert!(category_filter(None).is_empty());
        assert!(category_filter(Some(" , ")).is_empty());
        let filter = category_filter(Some("Garden, Shelter"));
        assert!(filter.includes("Garden"));
        assert!(filter.includes("Shelter"));
        assert!(!filter.includes("Backpack"));
    }

    #[test]
    fn style_has_base_layers_and_requested_overlays() {
        let locations = vec![
            Location::from_raw(&json!({
                "_id": "a", "Name": "A", "Category": "Garden",
                "latitude": 40.0, "longitude": -74.0,
            }))
            .unwrap(),
        ];
        let options = StyleOptions {
            locations: true,
            ..StyleOptions::default()
        };

        let style = render_style(empty_collection(), &locations, &[], None, &options).unwrap();
        assert_eq!(style["version"], json!(8));
        assert_eq!(
            layer_ids(&style),
            vec!["zip-fills", "zip-borders", "zip-labels", "locations-points"]
        );
        assert_eq!(
            style["sources"]["locations"]["data"]["features"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn hidden_overlays_are_not_added() {
        let style = render_style(
            empty_collection(),
            &[],
            &[],
            None,
            &StyleOptions::default(),
        )
        .unwrap();
        assert_eq!(layer_ids(&style), vec!["zip-fills", "zip-borders", "zip-labels"]);
        assert!(style["sources"].get("suppliers").is_none());
    }

    #[test]
    fn need_mode_paints_zip_fills() {
        let scores = NeedScores::from_regions(&[ZipRegion::new("08701")]);
        let options = StyleOptions {
            need: true,
            ..StyleOptions::default()
        };

        let style = render_style(empty_collection(), &[], &[], Some(&scores), &options).unwrap();
        let fill = style["layers"]
            .as_array()
            .unwrap()
            .iter()
            .find(|l| l["id"] == json!("zip-fills"))
            .unwrap();
        assert_eq!(fill["paint"]["fill-color"][0], json!("match"));
    }
}
