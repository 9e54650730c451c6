//! Subcommand implementations.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use food_map_analytics::NeedScores;
use food_map_cli_utils::{IndicatifProgress, MultiProgress};
use food_map_geocoder::{MapboxGeocoder, normalize_address};
use food_map_layers::CategoryFilter;
use food_map_locate::{LocateReport, fetch_and_locate};
use food_map_records_models::{Locatable, Location, Supplier, ZipRegion};
use food_map_store::{HttpStore, RecordStore as _, ServerStatus, check_health};
use geojson::FeatureCollection;

use crate::Collection;

type BoxError = Box<dyn std::error::Error>;

pub async fn health(api_url: &str) -> ServerStatus {
    check_health(&reqwest::Client::new(), api_url).await
}

/// Checks the record API every `interval` seconds until Ctrl-C, logging
/// each change of status.
pub async fn watch_health(api_url: &str, interval: u64, multi: &MultiProgress) {
    let client = reqwest::Client::new();
    let spinner = IndicatifProgress::spinner(multi, &format!("Watching {api_url}"));
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let mut last: Option<ServerStatus> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        let status = check_health(&client, api_url).await;
        if last.as_ref() != Some(&status) {
            if status.is_connected() {
                log::info!("{status}");
            } else {
                log::warn!("{status}");
            }
        }
        spinner.set_message(format!("{api_url}: {status}"));
        last = Some(status);
    }

    spinner.finish("Stopped watching".to_string());
}

fn geocoder() -> Result<MapboxGeocoder, BoxError> {
    let geocoder =
        MapboxGeocoder::from_registry(reqwest::Client::new(), std::env::var("MAPBOX_TOKEN").ok())?;
    if !geocoder.has_token() {
        log::warn!("MAPBOX_TOKEN is not set, records without coordinates stay unresolved");
    }
    Ok(geocoder)
}

/// Fetches and locates one collection, waiting for every write-back.
async fn locate_collection<T: Locatable>(
    api_url: &str,
    concurrency: Option<usize>,
    multi: &MultiProgress,
) -> Result<Vec<T>, BoxError> {
    let store = Arc::new(HttpStore::<T>::new(reqwest::Client::new(), api_url)?);
    let geocoder = geocoder()?;
    let concurrency = concurrency.unwrap_or(geocoder.config().concurrent_requests);
    let progress = IndicatifProgress::batch_bar(multi, &format!("Fetching {}", T::COLLECTION));

    let LocateReport {
        records,
        already_located,
        resolved,
        failed,
        write_backs,
    } = fetch_and_locate(store, &geocoder, concurrency, progress.as_ref()).await?;

    let saved = write_backs.settle().await;
    log::info!(
        "{}: {already_located} already located, {resolved} resolved, {failed} unresolved; \
         saved {} coordinates ({} failed)",
        T::COLLECTION,
        saved.succeeded,
        saved.failed
    );
    Ok(records)
}

/// Geocodes a collection's missing coordinates and prints a summary.
///
/// # Errors
///
/// Returns an error if the collection cannot be fetched.
pub async fn locate(
    api_url: &str,
    collection: Collection,
    concurrency: Option<usize>,
    multi: &MultiProgress,
) -> Result<(), BoxError> {
    let (total, located) = match collection {
        Collection::Locations => {
            let records: Vec<Location> = locate_collection(api_url, concurrency, multi).await?;
            (records.len(), records.iter().filter(|r| r.is_locatable()).count())
        }
        Collection::Suppliers => {
            let records: Vec<Supplier> = locate_collection(api_url, concurrency, multi).await?;
            (records.len(), records.iter().filter(|r| r.is_locatable()).count())
        }
    };
    println!("{located}/{total} records can be placed on the map");
    Ok(())
}

/// Locates a collection and projects it to point features.
///
/// # Errors
///
/// Returns an error if the collection cannot be fetched.
pub async fn project(
    api_url: &str,
    collection: Collection,
    categories: Option<&str>,
    concurrency: Option<usize>,
    multi: &MultiProgress,
) -> Result<FeatureCollection, BoxError> {
    let filter = categories.map_or_else(CategoryFilter::new, CategoryFilter::parse_list);

    Ok(match collection {
        Collection::Locations => {
            let records: Vec<Location> = locate_collection(api_url, concurrency, multi).await?;
            food_map_layers::project(filter.apply(&records))
        }
        Collection::Suppliers => {
            if !filter.is_empty() {
                log::warn!("Suppliers have no categories, ignoring --categories");
            }
            let records: Vec<Supplier> = locate_collection(api_url, concurrency, multi).await?;
            food_map_layers::project(&records)
        }
    })
}

/// Fetches every zip region and scores it.
///
/// # Errors
///
/// Returns an error if the zip regions cannot be fetched.
pub async fn scores(api_url: &str) -> Result<NeedScores, BoxError> {
    let store = HttpStore::<ZipRegion>::new(reqwest::Client::new(), api_url)?;
    let regions = store.get_all().await?;
    Ok(NeedScores::from_regions(&regions))
}

/// Renders ranked need scores as a table.
#[must_use]
pub fn format_scores(scores: &NeedScores, limit: Option<usize>) -> String {
    let ranked = scores.ranked();
    let shown = limit.unwrap_or(ranked.len()).min(ranked.len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<5} {:<8} {:<20} {:>8} {:>6}", "RANK", "ZIP", "COUNTY", "SCORE", "NORM");
    let _ = writeln!(out, "{}", "-".repeat(51));
    for (rank, region) in ranked.iter().take(shown).enumerate() {
        let _ = writeln!(
            out,
            "{:<5} {:<8} {:<20} {:>8.4} {:>6.2}",
            rank + 1,
            region.geography,
            region.county.as_deref().unwrap_or("-"),
            region.score,
            region.normalized
        );
    }
    let _ = writeln!(out, "\n{shown} of {} zip region(s)", ranked.len());
    out
}

/// Describes the geocoding query for an address.
///
/// # Errors
///
/// Returns an error if the address has no usable text.
pub fn normalize(address: &str) -> Result<String, BoxError> {
    let normalized = normalize_address(address)?;
    Ok(if normalized.truncated {
        format!("{} (truncated)", normalized.query)
    } else {
        normalized.query
    })
}
