//! Records to renderable point features.

use food_map_records_models::{Locatable, Location, Supplier};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, feature::Id};
use serde_json::Value;

/// A locatable record with a flat property bag for rendering.
pub trait Projectable: Locatable {
    fn properties(&self) -> JsonObject;
}

impl Projectable for Location {
    fn properties(&self) -> JsonObject {
        let mut props = JsonObject::new();
        props.insert("Name".to_string(), Value::from(self.name.as_str()));
        props.insert("Address".to_string(), Value::from(self.address.as_str()));
        props.insert("Category".to_string(), Value::from(self.category.as_str()));
        props.insert("id".to_string(), Value::from(self.id.as_str()));
        props
    }
}

impl Projectable for Supplier {
    fn properties(&self) -> JsonObject {
        let mut props = JsonObject::new();
        props.insert(
            "Identifier".to_string(),
            Value::from(self.identifier.as_str()),
        );
        props.insert("Address".to_string(), Value::from(self.address.as_str()));
        props.insert(
            "Partners".to_string(),
            self.partners.as_deref().map_or(Value::Null, Value::from),
        );
        props.insert("id".to_string(), Value::from(self.id.as_str()));
        props
    }
}

/// An empty feature collection.
#[must_use]
pub const fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}

/// One `Point` feature per locatable record at `[lon, lat]`; records
/// without coordinates are dropped.
pub fn project<'a, T, I>(records: I) -> FeatureCollection
where
    T: Projectable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let features = records
        .into_iter()
        .filter_map(|record| {
            let coordinates = record.coordinates()?;
            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::Point(
                    coordinates.lon_lat().to_vec(),
                ))),
                id: Some(Id::String(record.id().to_string())),
                properties: Some(record.properties()),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::point_of;
    use food_map_records_models::{Entity, Supplier};
    use serde_json::json;

    #[test]
    fn drops_unlocated_records() {
        let records = vec![
            Location::from_raw(&json!({ "_id": "a", "Name": "A", "latitude": 40.1, "longitude": -74.0 }))
                .unwrap(),
            Location::from_raw(&json!({ "_id": "b", "Name": "B" })).unwrap(),
            Location::from_raw(&json!({ "_id": "c", "Name": "C", "latitude": 40.3 })).unwrap(),
        ];

        let fc = project(&records);
        assert_eq!(fc.features.len(), 1);
        for feature in &fc.features {
            let id = feature.property("id").and_then(Value::as_str).unwrap();
            let source = records.iter().find(|r| r.id == id).unwrap();
            assert!(source.is_locatable());
        }
    }

    #[test]
    fn location_feature_is_lon_lat_with_flat_properties() {
        let loc = Location::from_raw(&json!({
            "_id": "a",
            "Name": "Pantry",
            "Address": "1 Main St",
            "latitude": 40.1,
            "longitude": -74.0,
        }))
        .unwrap();

        let fc = project([&loc]);
        let feature = &fc.features[0];
        assert_eq!(point_of(feature), Some([-74.0, 40.1]));
        assert_eq!(
            Value::Object(feature.properties.clone().unwrap()),
            json!({ "Name": "Pantry", "Address": "1 Main St", "Category": "Default", "id": "a" })
        );
    }

    #[test]
    fn supplier_feature_carries_partners() {
        let supplier = Supplier::from_raw(&json!({
            "_id": "s",
            "Identifier": "Farm",
            "Address": "9 Farm Rd",
            "Partners": "A, B",
            "latitude": 40.0,
            "longitude": -74.05,
        }))
        .unwrap();

        let fc = project([&supplier]);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["Identifier"], json!("Farm"));
        assert_eq!(props["Partners"], json!("A, B"));
        assert_eq!(props["id"], json!("s"));
    }

    #[test]
    fn serializes_as_geojson() {
        let fc = project::<Location, _>([]);
        let value = serde_json::to_value(&fc).unwrap();
        assert_eq!(value["type"], json!("FeatureCollection"));
        assert_eq!(value["features"], json!([]));
    }
}
