#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fills in missing coordinates on a batch of records.
//!
//! Every record without coordinates is geocoded once. Successful lookups
//! are merged into the in-memory record and persisted through a
//! fire-and-forget coordinate write-back, so later fetches of the same
//! record skip geocoding. Records that already carry coordinates are
//! never looked up again.
//!
//! Lookups run concurrently with a bounded number in flight. The merged
//! batch is returned only after every lookup has settled; write-backs may
//! still be running at that point and never delay the merge.

pub mod progress;

use std::sync::Arc;

use food_map_geocoder::Geocoder;
use food_map_records_models::{Coordinates, Entity, Locatable};
use food_map_store::{CoordinateStore, RecordStore, StoreError};
use futures::StreamExt as _;
use tokio::task::JoinHandle;

use crate::progress::ProgressCallback;

/// Outstanding coordinate write-backs from one locate pass.
///
/// Dropping this detaches the tasks; they still run to completion.
#[derive(Debug, Default)]
pub struct WriteBacks {
    handles: Vec<JoinHandle<bool>>,
}

/// Outcome of awaiting every write-back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteBackSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl WriteBacks {
    /// Number of write-backs issued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every write-back to finish.
    pub async fn settle(self) -> WriteBackSummary {
        let mut summary = WriteBackSummary::default();
        for handle in self.handles {
            match handle.await {
                Ok(true) => summary.succeeded += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    log::error!("Coordinate write-back task failed: {e}");
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

/// Result of a locate pass.
#[derive(Debug)]
pub struct LocateReport<T> {
    /// Every input record in input order, with resolved coordinates merged.
    pub records: Vec<T>,
    /// Records that already had coordinates.
    pub already_located: usize,
    /// Records resolved during this pass.
    pub resolved: usize,
    /// Records the geocoder could not resolve.
    pub failed: usize,
    /// Write-backs issued for the resolved records.
    pub write_backs: WriteBacks,
}

impl<T: Locatable> LocateReport<T> {
    /// Records that can be placed on the map.
    pub fn locatable(&self) -> impl Iterator<Item = &T> {
        self.records.iter().filter(|r| r.is_locatable())
    }
}

/// One settled lookup, keyed by the record's position in the batch.
struct Lookup {
    idx: usize,
    hit: Option<(Coordinates, String)>,
    write_back: Option<JoinHandle<bool>>,
}

/// Geocodes every record lacking coordinates and merges the results.
///
/// At most `concurrency` lookups are in flight at once (minimum 1). Each
/// successful lookup issues one `update_coordinates` call on `store` in a
/// detached task; failures there are logged and never retried.
pub async fn locate_missing<T: Locatable>(
    mut records: Vec<T>,
    geocoder: &dyn Geocoder,
    store: Arc<dyn CoordinateStore>,
    concurrency: usize,
    progress: &dyn ProgressCallback,
) -> LocateReport<T> {
    let pending: Vec<(usize, String, String)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.is_locatable())
        .map(|(idx, r)| (idx, r.id().to_string(), r.address().to_string()))
        .collect();

    let already_located = records.len() - pending.len();
    let total = pending.len();

    log::info!(
        "Locating {total} of {} {} records ({already_located} already located)",
        records.len(),
        T::LABEL
    );

    progress.set_total(total as u64);
    progress.set_message(format!("Geocoding {} addresses", T::LABEL));

    let settled: Vec<Lookup> =
        futures::stream::iter(pending)
            .map(|(idx, id, address)| {
                let store = Arc::clone(&store);
                async move {
                    let resolution = geocoder.resolve(&address).await;
                    progress.inc(1);

                    let Some(coordinates) = resolution.coordinates else {
                        log::warn!("No coordinates for {} {id} ('{address}')", T::LABEL);
                        return Lookup {
                            idx,
                            hit: None,
                            write_back: None,
                        };
                    };

                    let write_back = spawn_write_back(store, T::LABEL, id, coordinates);
                    Lookup {
                        idx,
                        hit: Some((coordinates, resolution.region)),
                        write_back: Some(write_back),
                    }
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    let mut resolved = 0;
    let mut handles = Vec::with_capacity(settled.len());

    for lookup in settled {
        if let Some((coordinates, region)) = lookup.hit {
            records[lookup.idx].apply_resolution(coordinates, &region);
            resolved += 1;
        }
        handles.extend(lookup.write_back);
    }

    let failed = total - resolved;
    progress.finish(format!(
        "Located {resolved}/{total} {} records ({failed} failed)",
        T::LABEL
    ));
    log::info!("Resolved {resolved}/{total} {} records, {failed} failed", T::LABEL);

    LocateReport {
        records,
        already_located,
        resolved,
        failed,
        write_backs: WriteBacks { handles },
    }
}

fn spawn_write_back(
    store: Arc<dyn CoordinateStore>,
    label: &'static str,
    id: String,
    coordinates: Coordinates,
) -> JoinHandle<bool> {
    tokio::spawn(async move {
        match store.update_coordinates(&id, coordinates).await {
            Ok(()) => {
                log::debug!("Saved coordinates for {label} {id}");
                true
            }
            Err(e) => {
                log::error!("Failed to save coordinates for {label} {id}: {e}");
                false
            }
        }
    })
}

/// A record collection paired with the store that persists its
/// coordinates.
pub struct LocatedCollection<T: Entity> {
    records: Arc<dyn RecordStore<T>>,
    coordinates: Arc<dyn CoordinateStore>,
}

impl<T: Entity> Clone for LocatedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            coordinates: Arc::clone(&self.coordinates),
        }
    }
}

impl<T: Locatable> LocatedCollection<T> {
    /// Uses one store for both reads and coordinate write-backs.
    #[must_use]
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: RecordStore<T> + CoordinateStore + 'static,
    {
        Self {
            records: store.clone(),
            coordinates: store,
        }
    }

    /// The record store.
    #[must_use]
    pub fn records(&self) -> &dyn RecordStore<T> {
        self.records.as_ref()
    }

    /// Fetches the whole collection and locates it.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the collection fetch fails. Geocoding
    /// and write-back failures never surface here.
    pub async fn fetch_and_locate(
        &self,
        geocoder: &dyn Geocoder,
        concurrency: usize,
        progress: &dyn ProgressCallback,
    ) -> Result<LocateReport<T>, StoreError> {
        let records = self.records.get_all().await.map_err(|e| {
            log::error!("Failed to fetch {} records: {e}", T::LABEL);
            e
        })?;
        Ok(locate_missing(
            records,
            geocoder,
            Arc::clone(&self.coordinates),
            concurrency,
            progress,
        )
        .await)
    }
}

/// Fetches a whole collection and locates it.
///
/// # Errors
///
/// Returns the store's error if the collection fetch fails. Geocoding and
/// write-back failures never surface here.
pub async fn fetch_and_locate<T, S>(
    store: Arc<S>,
    geocoder: &dyn Geocoder,
    concurrency: usize,
    progress: &dyn ProgressCallback,
) -> Result<LocateReport<T>, StoreError>
where
    T: Locatable,
    S: RecordStore<T> + CoordinateStore + 'static,
{
    LocatedCollection::new(store)
        .fetch_and_locate(geocoder, concurrency, progress)
        .await
}
