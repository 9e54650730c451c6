//! Feature builders shared by the unit tests.

use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::{Value, json};

pub use crate::projector::empty_collection;

pub fn point_feature_with(lon: f64, lat: f64, props: Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![lon, lat]))),
        id: None,
        properties: props.as_object().cloned(),
        foreign_members: None,
    }
}

pub fn point_feature(lon: f64, lat: f64) -> Feature {
    point_feature_with(lon, lat, json!({}))
}

pub fn zip_feature(zip: &str) -> Feature {
    Feature {
        bbox: None,
        geometry: None,
        id: None,
        properties: json!({ "ZCTA5CE10": zip }).as_object().cloned(),
        foreign_members: None,
    }
}

pub fn point_collection(n: usize) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let offset = i as f64 * 0.01;
                point_feature_with(-74.0 + offset, 40.0 + offset, json!({ "id": i.to_string() }))
            })
            .collect(),
        foreign_members: None,
    }
}
