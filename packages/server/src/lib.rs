#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web map API server for the food map dashboard.
//!
//! Every layer request runs the full sync pipeline against the dashboard
//! record API: fetch the collection, geocode records that lack
//! coordinates (writing the results back), apply the category filter,
//! and project the survivors to `GeoJSON`. The `/api/style` endpoint
//! drives the map controller and layer reconcilers against an in-memory
//! style document and returns the resulting sources and layers.

mod handlers;
pub mod pipeline;

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use food_map_geocoder::{GeocodeError, Geocoder, MapboxGeocoder};
use food_map_layers::{LayerError, empty_collection};
use food_map_locate::LocatedCollection;
use food_map_records_models::{Location, Supplier, ZipRegion};
use food_map_store::{HttpStore, RecordStore, StoreError};
use geojson::FeatureCollection;

/// Errors raised while starting the server or serving a request.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The style surface was already torn down.
    #[error("style surface is no longer available")]
    SurfaceUnavailable,
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Dashboard record API base URL (`FOOD_MAP_API_URL`).
    pub api_url: String,
    /// Mapbox access token (`MAPBOX_TOKEN`).
    pub mapbox_token: Option<String>,
    /// Zip boundary `GeoJSON` file (`ZIP_BOUNDARIES_PATH`).
    pub zip_boundaries: Option<PathBuf>,
    pub bind_addr: String,
    pub port: u16,
    /// Geocoding lookups in flight per request (`GEOCODE_CONCURRENCY`);
    /// the geocoding service's own limit when unset.
    pub concurrency: Option<usize>,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_url: food_map_store::api_url_from_env(),
            mapbox_token: std::env::var("MAPBOX_TOKEN").ok(),
            zip_boundaries: std::env::var_os("ZIP_BOUNDARIES_PATH").map(PathBuf::from),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            concurrency: std::env::var("GEOCODE_CONCURRENCY")
                .ok()
                .and_then(|c| c.parse().ok()),
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub client: reqwest::Client,
    /// Dashboard record API base URL, for health checks.
    pub api_url: String,
    pub geocoder: Arc<dyn Geocoder>,
    pub locations: LocatedCollection<Location>,
    pub suppliers: LocatedCollection<Supplier>,
    pub zips: Arc<dyn RecordStore<ZipRegion>>,
    /// Zip boundary polygons for the base layers.
    pub zip_boundaries: FeatureCollection,
    pub concurrency: usize,
}

impl AppState {
    /// Builds the HTTP-backed stores and the geocoder.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the API URL is invalid, no geocoding
    /// service is registered, or the zip boundary file cannot be read.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let client = reqwest::Client::new();

        let geocoder = MapboxGeocoder::from_registry(client.clone(), config.mapbox_token.clone())?;
        if !geocoder.has_token() {
            log::warn!("MAPBOX_TOKEN is not set, records without coordinates stay off the map");
        }

        let concurrency = config
            .concurrency
            .unwrap_or(geocoder.config().concurrent_requests);

        let zip_boundaries = match &config.zip_boundaries {
            Some(path) => load_zip_boundaries(path)?,
            None => {
                log::warn!("ZIP_BOUNDARIES_PATH is not set, zip layers will be empty");
                empty_collection()
            }
        };

        Ok(Self {
            locations: LocatedCollection::new(Arc::new(HttpStore::<Location>::new(
                client.clone(),
                &config.api_url,
            )?)),
            suppliers: LocatedCollection::new(Arc::new(HttpStore::<Supplier>::new(
                client.clone(),
                &config.api_url,
            )?)),
            zips: Arc::new(HttpStore::<ZipRegion>::new(client.clone(), &config.api_url)?),
            geocoder: Arc::new(geocoder),
            api_url: config.api_url.clone(),
            client,
            zip_boundaries,
            concurrency,
        })
    }
}

/// Reads a `GeoJSON` feature collection of zip boundary polygons.
///
/// # Errors
///
/// Returns [`ServerError`] if the file cannot be read or parsed.
pub fn load_zip_boundaries(path: &Path) -> Result<FeatureCollection, ServerError> {
    let text = std::fs::read_to_string(path)?;
    let collection: FeatureCollection = serde_json::from_str(&text)?;
    log::info!(
        "Loaded {} zip boundaries from {}",
        collection.features.len(),
        path.display()
    );
    Ok(collection)
}

/// Registers the `/api` routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/categories", web::get().to(handlers::categories))
            .route("/layers/locations", web::get().to(handlers::location_layer))
            .route("/layers/suppliers", web::get().to(handlers::supplier_layer))
            .route("/need-scores", web::get().to(handlers::need_scores))
            .route("/zips/{geography}", web::get().to(handlers::zip_detail))
            .route("/style", web::get().to(handlers::style)),
    );
}

/// Starts the map API server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns [`ServerError`] if the state cannot be built, the server fails
/// to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let state = web::Data::new(AppState::from_config(&config)?);

    log::info!(
        "Starting server on {}:{} (record API at {})",
        config.bind_addr,
        config.port,
        config.api_url
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_boundaries_load_from_geojson_file() {
        let path = std::env::temp_dir().join(format!("zips-{}.geojson", std::process::id()));
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null,"properties":{"ZCTA5CE10":"08701"}}]}"#,
        )
        .unwrap();

        let collection = load_zip_boundaries(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(collection.features.len(), 1);
    }

    #[test]
    fn missing_zip_boundary_file_is_an_io_error() {
        let err = load_zip_boundaries(Path::new("/nonexistent/zips.geojson")).unwrap_err();
        assert!(matches!(err, ServerError::Io(_)));
    }

    #[test]
    fn state_builds_without_token() {
        let config = ServerConfig {
            api_url: "http://localhost:5000/api".to_string(),
            mapbox_token: None,
            zip_boundaries: None,
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            concurrency: Some(4),
        };
        let state = AppState::from_config(&config).unwrap();
        assert!(state.zip_boundaries.features.is_empty());
        assert_eq!(state.concurrency, 4);
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        let config = ServerConfig {
            api_url: "not a url".to_string(),
            mapbox_token: None,
            zip_boundaries: None,
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            concurrency: None,
        };
        assert!(matches!(
            AppState::from_config(&config),
            Err(ServerError::Store(_))
        ));
    }
}
