use serde::{Deserialize, Serialize};

use crate::{Coordinates, Entity, Locatable, RecordError, raw};

/// A food supplier (grocery partner, farm, distributor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    /// Store identity (`_id` upstream).
    pub id: String,
    /// Supplier identifier / display name.
    pub identifier: String,
    /// Street address.
    pub address: String,
    /// Partner organizations, free text.
    pub partners: Option<String>,
    /// Resolved position, if known.
    pub coordinates: Option<Coordinates>,
}

impl Entity for Supplier {
    const COLLECTION: &'static str = "suppliers";
    const LABEL: &'static str = "supplier";

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
            identifier: raw::string_field(obj, &["identifier", "Identifier"]).unwrap_or_default(),
            address: raw::string_field(obj, &["address", "Address"]).unwrap_or_default(),
            partners: raw::string_field(obj, &["partners", "Partners"]),
            coordinates,
            id,
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Locatable for Supplier {
    fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn display_name(&self) -> &str {
        &self.identifier
    }

    fn apply_resolution(&mut self, coordinates: Coordinates, _region: &str) {
        self.coordinates = Some(coordinates);
    }
}
