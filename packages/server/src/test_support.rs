//! In-memory stores and geocoder for handler tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use food_map_geocoder::{Geocoder, Resolution};
use food_map_layers::empty_collection;
use food_map_locate::LocatedCollection;
use food_map_records_models::{Coordinates, Entity};
use food_map_store::{CoordinateStore, DeleteResponse, RecordStore, StoreError};
use serde_json::Value;

use crate::AppState;

#[derive(Clone, Default)]
pub struct FakeStore {
    records: Vec<Value>,
    fail: bool,
    pub writes: Arc<Mutex<Vec<String>>>,
}

impl FakeStore {
    pub fn with(records: Vec<Value>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Parse {
                message: "offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> RecordStore<T> for FakeStore {
    async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        self.check()?;
        Ok(self
            .records
            .iter()
            .filter_map(|v| T::from_raw(v).ok())
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.check()?;
        Ok(self
            .records
            .iter()
            .filter_map(|v| T::from_raw(v).ok())
            .find(|r| r.id() == id))
    }

    async fn create(&self, payload: &Value) -> Result<T, StoreError> {
        Ok(T::from_raw(payload)?)
    }

    async fn update(&self, _id: &str, payload: &Value) -> Result<T, StoreError> {
        Ok(T::from_raw(payload)?)
    }

    async fn delete(&self, _id: &str) -> Result<DeleteResponse, StoreError> {
        Ok(DeleteResponse::default())
    }

    async fn delete_all(&self) -> Result<DeleteResponse, StoreError> {
        Ok(DeleteResponse::default())
    }
}

#[async_trait]
impl CoordinateStore for FakeStore {
    async fn update_coordinates(&self, id: &str, _coordinates: Coordinates) -> Result<(), StoreError> {
        self.check()?;
        self.writes.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeGeocoder {
    known: BTreeMap<String, Coordinates>,
}

impl FakeGeocoder {
    pub fn with(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        self.known
            .insert(address.to_string(), Coordinates::new(latitude, longitude).unwrap());
        self
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn resolve(&self, address: &str) -> Resolution {
        self.known.get(address).map_or_else(Resolution::unresolved, |c| {
            Resolution::resolved(*c, Some("New Jersey".to_string()))
        })
    }
}

pub fn state(locations: FakeStore, suppliers: FakeStore, zips: FakeStore) -> AppState {
    AppState {
        client: reqwest::Client::new(),
        api_url: "http://127.0.0.1:9/api".to_string(),
        geocoder: Arc::new(FakeGeocoder::default()),
        locations: LocatedCollection::new(Arc::new(locations)),
        suppliers: LocatedCollection::new(Arc::new(suppliers)),
        zips: Arc::new(zips),
        zip_boundaries: empty_collection(),
        concurrency: 4,
    }
}
