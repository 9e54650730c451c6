//! Geocoding service definitions embedded from `services/*.toml`.
//!
//! The enabled definition with the smallest `priority` is the one
//! [`MapboxGeocoder`] talks to; disabled entries are kept for reference.
//!
//! [`MapboxGeocoder`]: crate::MapboxGeocoder

use serde::Deserialize;

/// One `services/*.toml` definition.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"mapbox"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection order; lower values win.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Mapbox forward geocoding (`mapbox.places`).
    Mapbox(MapboxConfig),
}

/// Settings for the Mapbox forward geocoding endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MapboxConfig {
    /// Endpoint base URL; the query is appended as `/{query}.json`.
    pub base_url: String,
    /// ISO country filter.
    #[serde(default = "default_country")]
    pub country: String,
    /// Maximum number of results requested.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Number of lookups allowed in flight at once.
    #[serde(default = "default_concurrent")]
    pub concurrent_requests: usize,
}

const fn default_true() -> bool {
    true
}

fn default_country() -> String {
    "US".to_string()
}

const fn default_limit() -> u32 {
    1
}

const fn default_concurrent() -> usize {
    10
}

/// An embedded service definition that failed to parse.
#[derive(Debug, thiserror::Error)]
#[error("invalid geocoding service definition '{file}': {source}")]
pub struct RegistryError {
    /// File stem under `services/`.
    pub file: &'static str,
    #[source]
    pub source: toml::de::Error,
}

impl GeocodingService {
    /// Endpoint settings for Mapbox-type providers.
    #[must_use]
    pub const fn mapbox(&self) -> &MapboxConfig {
        match &self.provider {
            ProviderConfig::Mapbox(cfg) => cfg,
        }
    }
}

const SERVICE_FILES: &[(&str, &str)] = &[("mapbox", include_str!("../services/mapbox.toml"))];

/// Parses every embedded service definition, enabled or not.
///
/// # Errors
///
/// Returns [`RegistryError`] for the first definition that does not parse.
pub fn all_services() -> Result<Vec<GeocodingService>, RegistryError> {
    SERVICE_FILES
        .iter()
        .map(|&(file, text)| toml::de::from_str(text).map_err(|source| RegistryError { file, source }))
        .collect()
}

/// The enabled service with the lowest priority value, if any.
///
/// # Errors
///
/// Returns [`RegistryError`] if a definition does not parse.
pub fn primary_service() -> Result<Option<GeocodingService>, RegistryError> {
    Ok(all_services()?
        .into_iter()
        .filter(|s| s.enabled)
        .min_by_key(|s| s.priority))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_definitions_parse() {
        let services = all_services().unwrap();
        assert_eq!(services.len(), SERVICE_FILES.len());
        for svc in &services {
            assert!(!svc.name.is_empty(), "{} has no name", svc.id);
            assert!(svc.mapbox().base_url.starts_with("https://"));
            assert!(svc.mapbox().concurrent_requests > 0);
        }
    }

    #[test]
    fn primary_is_mapbox_for_one_us_result() {
        let svc = primary_service().unwrap().unwrap();
        assert_eq!(svc.id, "mapbox");
        assert_eq!(svc.mapbox().country, "US");
        assert_eq!(svc.mapbox().limit, 1);
    }

    #[test]
    fn omitted_provider_fields_take_defaults() {
        let svc: GeocodingService = toml::de::from_str(
            r#"
            id = "local"
            name = "Local"
            priority = 5

            [provider]
            type = "mapbox"
            base_url = "http://127.0.0.1:9000"
            "#,
        )
        .unwrap();
        assert!(svc.enabled);
        assert_eq!(svc.mapbox().country, "US");
        assert_eq!(svc.mapbox().limit, 1);
        assert_eq!(svc.mapbox().concurrent_requests, 10);
    }

    #[test]
    fn unknown_provider_type_is_rejected() {
        let parsed: Result<GeocodingService, _> = toml::de::from_str(
            r#"
            id = "x"
            name = "X"
            priority = 1

            [provider]
            type = "carrier_pigeon"
            "#,
        );
        assert!(parsed.is_err());
    }
}
