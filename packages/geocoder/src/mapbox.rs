//! Mapbox forward geocoding client.
//!
//! Issues `GET {base_url}/{query}.json?access_token=…&country=US&limit=1`
//! and reads the first feature's `center` (`[lon, lat]`) plus the region
//! name from its `context` entries.
//!
//! See <https://docs.mapbox.com/api/search/geocoding-v5/>

use async_trait::async_trait;
use food_map_records_models::Coordinates;

use crate::address::normalize_address;
use crate::service_registry::{self, MapboxConfig, ProviderConfig};
use crate::{GeocodeError, GeocodedAddress, Geocoder, Resolution};

/// Maximum number of response body bytes kept in error messages.
const ERROR_BODY_PREVIEW_LEN: usize = 300;

/// Geocoder backed by the Mapbox places endpoint.
#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    client: reqwest::Client,
    config: MapboxConfig,
    token: Option<String>,
}

impl MapboxGeocoder {
    /// Creates a geocoder for the given endpoint configuration.
    ///
    /// A missing or blank token is accepted here; every lookup will then
    /// fail soft with [`GeocodeError::MissingToken`].
    #[must_use]
    pub fn new(client: reqwest::Client, config: MapboxConfig, token: Option<String>) -> Self {
        Self {
            client,
            config,
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Creates a geocoder from the highest-priority registry entry.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::NoService`] if no geocoding service is
    /// enabled, or [`GeocodeError::Registry`] if a definition is malformed.
    pub fn from_registry(
        client: reqwest::Client,
        token: Option<String>,
    ) -> Result<Self, GeocodeError> {
        let service = service_registry::primary_service()?.ok_or(GeocodeError::NoService)?;
        log::debug!("Using geocoding service '{}' ({})", service.id, service.name);
        let ProviderConfig::Mapbox(config) = service.provider;
        Ok(Self::new(client, config, token))
    }

    /// Endpoint configuration in use.
    #[must_use]
    pub const fn config(&self) -> &MapboxConfig {
        &self.config
    }

    /// Whether an access token is configured.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Resolves an address, reporting why resolution failed.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the token is missing, the address is
    /// empty, the request fails, the API returns a non-success status, or
    /// the response has no usable result.
    pub async fn try_resolve(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        let normalized = normalize_address(address)?;
        let token = self.token.as_deref().ok_or(GeocodeError::MissingToken)?;
        geocode(&self.client, &self.config, &normalized.query, token).await
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn resolve(&self, address: &str) -> Resolution {
        match self.try_resolve(address).await {
            Ok(hit) => Resolution::resolved(hit.coordinates, hit.region),
            Err(e) => {
                match &e {
                    GeocodeError::NoResults { .. } | GeocodeError::Address(_) => {
                        log::warn!("Could not geocode '{address}': {e}");
                    }
                    _ => log::error!("Geocoding failed for '{address}': {e}"),
                }
                Resolution::unresolved()
            }
        }
    }
}

/// Builds the request URL for a query. The query is percent-encoded as a
/// single path segment.
///
/// # Errors
///
/// Returns [`GeocodeError::InvalidUrl`] if the base URL cannot be parsed
/// or cannot carry path segments.
pub fn request_url(
    config: &MapboxConfig,
    query: &str,
    token: &str,
) -> Result<reqwest::Url, GeocodeError> {
    let mut url = reqwest::Url::parse(&config.base_url).map_err(|e| GeocodeError::InvalidUrl {
        message: format!("{}: {e}", config.base_url),
    })?;

    url.path_segments_mut()
        .map_err(|()| GeocodeError::InvalidUrl {
            message: format!("{} cannot be a base URL", config.base_url),
        })?
        .pop_if_empty()
        .push(&format!("{query}.json"));

    url.query_pairs_mut()
        .append_pair("access_token", token)
        .append_pair("country", &config.country)
        .append_pair("limit", &config.limit.to_string());

    Ok(url)
}

/// Performs one forward geocoding request. No retry.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the request fails, the API returns a
/// non-success status, or the response has no usable result.
pub async fn geocode(
    client: &reqwest::Client,
    config: &MapboxConfig,
    query: &str,
    token: &str,
) -> Result<GeocodedAddress, GeocodeError> {
    let url = request_url(config, query, token)?;

    let resp = client.get(url).send().await?;
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GeocodeError::Status {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_PREVIEW_LEN).collect(),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body, query)
}

/// Parses a Mapbox `FeatureCollection` response.
fn parse_response(body: &serde_json::Value, query: &str) -> Result<GeocodedAddress, GeocodeError> {
    let features = body
        .get("features")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "response missing 'features' array".to_string(),
        })?;

    let Some(first) = features.first() else {
        return Err(GeocodeError::NoResults {
            query: query.to_string(),
        });
    };

    let center = first
        .get("center")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "feature missing 'center'".to_string(),
        })?;

    if center.len() != 2 {
        return Err(GeocodeError::Parse {
            message: format!("'center' has {} elements, expected 2", center.len()),
        });
    }

    let lng = center[0].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "longitude is not a number".to_string(),
    })?;
    let lat = center[1].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "latitude is not a number".to_string(),
    })?;

    let coordinates = Coordinates::new(lat, lng).ok_or_else(|| GeocodeError::Parse {
        message: format!("non-finite coordinates [{lng}, {lat}]"),
    })?;

    let region = first
        .get("context")
        .and_then(serde_json::Value::as_array)
        .and_then(|ctx| {
            ctx.iter().find(|entry| {
                entry
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|id| id.contains("region"))
            })
        })
        .and_then(|entry| entry.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    let place_name = first
        .get("place_name")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    Ok(GeocodedAddress {
        coordinates,
        region,
        place_name,
    })
}
