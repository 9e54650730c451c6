#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types for the food map.
//!
//! Service locations, suppliers, and zip-code demographic regions as
//! served by the dashboard's CRUD API. Upstream records drift between
//! `Category` and `category` style field names; every record passes
//! through [`Entity::from_raw`] exactly once when it enters the system,
//! and everything downstream works on the canonical structs defined here.

pub mod category;
pub mod raw;

mod location;
mod supplier;
mod zip;

pub use category::{DEFAULT_CATEGORY, LocationCategory, category_color};
pub use location::Location;
pub use supplier::Supplier;
pub use zip::{ValidationIssue, ZipRegion};

use serde::{Deserialize, Serialize};

/// Errors raised while canonicalizing a raw record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The raw value was not a JSON object.
    #[error("{entity} record is not a JSON object")]
    NotAnObject {
        /// Entity label (e.g. `"location"`).
        entity: &'static str,
    },

    /// A required field was absent or empty.
    #[error("{entity} record is missing required field '{field}'")]
    MissingField {
        /// Entity label (e.g. `"location"`).
        entity: &'static str,
        /// Canonical field name.
        field: &'static str,
    },
}

/// A WGS84 point. Both components are always present together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Builds coordinates from a latitude/longitude pair, rejecting
    /// non-finite values.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        (latitude.is_finite() && longitude.is_finite()).then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Builds coordinates from a `[lon, lat]` pair, the order used by
    /// `GeoJSON` and the geocoding API.
    #[must_use]
    pub fn from_lon_lat(lon_lat: [f64; 2]) -> Option<Self> {
        Self::new(lon_lat[1], lon_lat[0])
    }

    /// Returns `[longitude, latitude]`.
    #[must_use]
    pub const fn lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// A record type served by one CRUD collection of the dashboard API.
pub trait Entity: Sized + Send + Sync + 'static {
    /// URL path segment of the collection (e.g. `"locations"`).
    const COLLECTION: &'static str;

    /// Singular label used in logs and errors.
    const LABEL: &'static str;

    /// Canonicalizes a raw API object into this record type.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the value is not an object or lacks the
    /// record's identity field.
    fn from_raw(value: &serde_json::Value) -> Result<Self, RecordError>;

    /// Returns the record's identity.
    fn id(&self) -> &str;
}

/// A record that can be placed on the map once it has coordinates.
pub trait Locatable: Entity + Clone {
    /// Resolved coordinates, if any.
    fn coordinates(&self) -> Option<Coordinates>;

    /// Free-text street address used for geocoding.
    fn address(&self) -> &str;

    /// Human-readable name used in logs and popups.
    fn display_name(&self) -> &str;

    /// Merges a geocoding result into the record.
    fn apply_resolution(&mut self, coordinates: Coordinates, region: &str);

    /// Whether both coordinates are present.
    fn is_locatable(&self) -> bool {
        self.coordinates().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_coordinates() {
        assert!(Coordinates::new(f64::NAN, -74.0).is_none());
        assert!(Coordinates::new(40.0, f64::INFINITY).is_none());
        assert!(Coordinates::new(40.0, -74.0).is_some());
    }

    #[test]
    fn lon_lat_order_is_preserved() {
        let c = Coordinates::from_lon_lat([-74.12, 40.05]).unwrap();
        assert!((c.latitude - 40.05).abs() < f64::EPSILON);
        assert!((c.longitude - -74.12).abs() < f64::EPSILON);
        assert_eq!(c.lon_lat(), [-74.12, 40.05]);
    }
}
