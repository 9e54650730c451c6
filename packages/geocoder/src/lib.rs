#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding for food map records.
//!
//! Free-text addresses are normalized ([`address`]) and resolved through
//! the Mapbox forward geocoding API ([`mapbox`]). The [`Geocoder`] trait is
//! the seam the rest of the workspace depends on; its `resolve` never
//! fails, reporting problems through the log and an unresolved
//! [`Resolution`] instead.

pub mod address;
pub mod mapbox;
pub mod service_registry;

use async_trait::async_trait;
use food_map_records_models::Coordinates;

pub use address::{AddressError, NormalizedAddress, normalize_address};
pub use mapbox::MapboxGeocoder;

/// Region name used when a lookup fails or has no region context.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Errors that can occur during a single geocoding lookup.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// No access token configured.
    #[error("Mapbox access token is not configured")]
    MissingToken,

    /// No enabled geocoding service in the registry.
    #[error("No enabled geocoding service")]
    NoService,

    /// An embedded service definition is malformed.
    #[error(transparent)]
    Registry(#[from] service_registry::RegistryError),

    /// The address could not be turned into a query.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Geocoding API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body.
        body: String,
    },

    /// The API returned zero features.
    #[error("No geocoding results for '{query}'")]
    NoResults {
        /// The query that was sent.
        query: String,
    },

    /// The response body was not in the expected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// The configured endpoint is not a usable URL.
    #[error("Invalid geocoding URL: {message}")]
    InvalidUrl {
        /// Description of the problem.
        message: String,
    },
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Resolved position.
    pub coordinates: Coordinates,
    /// Name of the region context entry, if the result had one.
    pub region: Option<String>,
    /// Full place name reported by the provider.
    pub place_name: Option<String>,
}

/// Outcome of [`Geocoder::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Resolved position, or `None` when the lookup failed.
    pub coordinates: Option<Coordinates>,
    /// Region name, [`UNKNOWN_REGION`] when unavailable.
    pub region: String,
}

impl Resolution {
    /// A successful resolution. A missing region becomes [`UNKNOWN_REGION`].
    #[must_use]
    pub fn resolved(coordinates: Coordinates, region: Option<String>) -> Self {
        Self {
            coordinates: Some(coordinates),
            region: region.unwrap_or_else(|| UNKNOWN_REGION.to_string()),
        }
    }

    /// A failed resolution.
    #[must_use]
    pub fn unresolved() -> Self {
        Self {
            coordinates: None,
            region: UNKNOWN_REGION.to_string(),
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Resolves free-text addresses to coordinates.
///
/// Implementations must not fail: any problem is logged and reported as
/// [`Resolution::unresolved`].
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves one address.
    async fn resolve(&self, address: &str) -> Resolution;
}
