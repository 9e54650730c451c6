use serde::{Deserialize, Serialize};

use crate::{Coordinates, DEFAULT_CATEGORY, Entity, Locatable, RecordError, raw};

/// A food distribution service location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Store identity (`_id` upstream).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Program category, [`DEFAULT_CATEGORY`] when the source has none.
    pub category: String,
    /// Resolved position, if known.
    pub coordinates: Option<Coordinates>,
    /// Region name reported by the geocoder (stored upstream as `county`).
    pub region: Option<String>,
}

impl Entity for Location {
    const COLLECTION: &'static str = "locations";
    const LABEL: &'static str = "location";

    fn from_raw(value: &serde_json::Value) -> Result<Self, RecordError> {
        let obj = value.as_object().ok_or(RecordError::NotAnObject {
            entity: Self::LABEL,
        })?;

        let id = raw::string_field(obj, &["_id", "id"]).ok_or(RecordError::MissingField {
            entity: Self::LABEL,
            field: "id",
        })?;

        let coordinates = raw::coordinates(obj, Self::LABEL, &id);

        Ok(Self {
            name: raw::string_field(obj, &["Name", "name"]).unwrap_or_default(),
            address: raw::string_field(obj, &["Address", "address"]).unwrap_or_default(),
            category: raw::string_field(obj, &["Category", "category"])
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            region: raw::string_field(obj, &["region", "county", "County"]),
            coordinates,
            id,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Locatable for Location {
    fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn apply_resolution(&mut self, coordinates: Coordinates, region: &str) {
        self.coordinates = Some(coordinates);
        self.region = Some(region.to_string());
    }
}
