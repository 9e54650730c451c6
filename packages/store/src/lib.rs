#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Access to the dashboard's record CRUD API.
//!
//! Each record type lives in its own REST collection:
//!
//! - `GET/POST/DELETE {api}/{collection}`
//! - `GET/PUT/DELETE {api}/{collection}/{id}`
//! - `PUT {api}/{collection}/{id}/coordinates`
//!
//! [`RecordStore`] and [`CoordinateStore`] are the seams the rest of the
//! workspace depends on; [`HttpStore`] implements both over `reqwest`.

pub mod health;
pub mod http;

#[cfg(test)]
pub(crate) mod test_server;

use async_trait::async_trait;
use food_map_records_models::{Coordinates, Entity, RecordError};
use serde::{Deserialize, Serialize};

pub use health::{HEALTH_TIMEOUT, ServerStatus, check_health};
pub use http::HttpStore;

/// API base URL used when `FOOD_MAP_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Returns the API base URL from `FOOD_MAP_API_URL`, or
/// [`DEFAULT_API_URL`].
#[must_use]
pub fn api_url_from_env() -> String {
    std::env::var("FOOD_MAP_API_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Errors from the record API.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        /// Request method.
        method: &'static str,
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body.
        body: String,
    },

    /// A returned record could not be canonicalized.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The response body was not in the expected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// The API base URL is unusable.
    #[error("Invalid API URL: {message}")]
    InvalidUrl {
        /// Description of the problem.
        message: String,
    },
}

/// Body returned by the delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Whether the store reports the deletion as done.
    #[serde(default)]
    pub success: bool,
    /// Optional human-readable detail.
    #[serde(default)]
    pub message: Option<String>,
}

/// CRUD operations over one record collection.
///
/// Create and update payloads are passed through as raw JSON because the
/// forms that build them own their shape; returned records are
/// canonicalized through [`Entity::from_raw`].
#[async_trait]
pub trait RecordStore<T: Entity>: Send + Sync {
    /// Fetches the whole collection.
    ///
    /// Records that cannot be canonicalized are logged and skipped.
    async fn get_all(&self) -> Result<Vec<T>, StoreError>;

    /// Fetches one record; `None` when the store has no such id.
    async fn get(&self, id: &str) -> Result<Option<T>, StoreError>;

    /// Creates a record and returns it as stored.
    async fn create(&self, payload: &serde_json::Value) -> Result<T, StoreError>;

    /// Replaces a record and returns it as stored.
    async fn update(&self, id: &str, payload: &serde_json::Value) -> Result<T, StoreError>;

    /// Deletes one record.
    async fn delete(&self, id: &str) -> Result<DeleteResponse, StoreError>;

    /// Deletes every record in the collection.
    async fn delete_all(&self) -> Result<DeleteResponse, StoreError>;
}

/// Persists resolved coordinates for locatable records.
#[async_trait]
pub trait CoordinateStore: Send + Sync {
    /// Stores `{latitude, longitude}` on the record with the given id.
    async fn update_coordinates(&self, id: &str, coordinates: Coordinates)
    -> Result<(), StoreError>;
}
