#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the food map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the record types to allow independent evolution of the API
//! contract.

use food_map_analytics::{NeedScores, RankedRegion};
use food_map_records_models::ZipRegion;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether this server is up (always `true` when it answers).
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Connectivity to the dashboard record API.
    pub backend: ApiBackendStatus,
}

/// Connectivity to the dashboard record API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBackendStatus {
    pub api_url: String,
    pub connected: bool,
    /// Human-readable status line.
    pub message: String,
}

/// One legend entry of the location category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCategory {
    pub name: String,
    /// Hex color used by the paint rule, legend, and popups.
    pub color: String,
}

/// Query parameters for the layer endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerQueryParams {
    /// Comma-separated categories to show. Absent means every category.
    pub categories: Option<String>,
}

/// Query parameters for the style endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleQueryParams {
    /// Comma-separated categories to show. Absent means every category.
    pub categories: Option<String>,
    /// Show the location overlay (default `true`).
    pub locations: Option<bool>,
    /// Show the supplier overlay (default `false`).
    pub suppliers: Option<bool>,
    /// Paint zip regions by need score (default `false`).
    pub need: Option<bool>,
}

/// One scored zip region with its fill encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNeedRegion {
    pub geography: String,
    pub county: Option<String>,
    pub score: f64,
    /// Score divided by the collection maximum.
    pub normalized: f64,
    pub color: String,
    pub opacity: f64,
}

/// Need scores for every zip region, highest need first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNeedScores {
    /// Normalization divisor.
    pub max: f64,
    pub regions: Vec<ApiNeedRegion>,
}

impl From<&NeedScores> for ApiNeedScores {
    fn from(scores: &NeedScores) -> Self {
        let regions = scores
            .ranked()
            .into_iter()
            .map(|RankedRegion { geography, county, score, normalized }| {
                let encoding = scores.encoding(&geography);
                ApiNeedRegion {
                    geography,
                    county,
                    score,
                    normalized,
                    color: encoding.color,
                    opacity: encoding.opacity,
                }
            })
            .collect();

        Self {
            max: scores.max(),
            regions,
        }
    }
}

/// A zip region's figures with its need score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZipDetail {
    #[serde(flatten)]
    pub region: ZipRegion,
    pub need_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn need_scores_are_ranked_with_encodings() {
        let mut high = ZipRegion::new("07719");
        high.food_insecurity_rate = Some(0.3);
        high.poverty_rate = Some(0.2);
        high.unemployment_rate = Some(0.1);
        high.population = Some(50_000.0);
        let low = ZipRegion::new("07720");

        let api = ApiNeedScores::from(&NeedScores::from_regions(&[low, high]));
        assert_eq!(api.regions.len(), 2);
        assert_eq!(api.regions[0].geography, "07719");
        assert_eq!(api.regions[0].color, "#08519c");
        assert!((api.regions[0].normalized - 1.0).abs() < 1e-12);
        assert_eq!(api.regions[1].color, "#eff3ff");
    }

    #[test]
    fn empty_scores_use_unit_max() {
        let api = ApiNeedScores::from(&NeedScores::default());
        assert!(api.regions.is_empty());
        assert!((api.max - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn health_is_camel_case() {
        let health = ApiHealth {
            healthy: true,
            version: "0.1.0".to_string(),
            backend: ApiBackendStatus {
                api_url: "http://localhost:5000/api".to_string(),
                connected: false,
                message: "Connection timeout. Server not responding.".to_string(),
            },
        };
        let value = serde_json::to_value(&health).unwrap();
        assert_eq!(value["backend"]["apiUrl"], json!("http://localhost:5000/api"));
        assert_eq!(value["backend"]["connected"], json!(false));
    }

    #[test]
    fn zip_detail_flattens_region() {
        let detail = ApiZipDetail {
            region: ZipRegion::new("08701"),
            need_score: 0.0,
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["geography"], json!("08701"));
        assert_eq!(value["needScore"], json!(0.0));
    }
}
