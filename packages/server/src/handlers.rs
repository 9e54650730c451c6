//! HTTP handler functions for the food map API.

use actix_web::{HttpResponse, web};
use food_map_analytics::need_score;
use food_map_layers::reconciler::legend;
use food_map_server_models::{
    ApiBackendStatus, ApiCategory, ApiHealth, ApiNeedScores, ApiZipDetail, LayerQueryParams,
    StyleQueryParams,
};
use food_map_store::check_health;

use crate::pipeline::{self, StyleOptions, category_filter};
use crate::{AppState, ServerError};

fn internal_error(what: &str, e: &ServerError) -> HttpResponse {
    log::error!("Failed to {what}: {e}");
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": format!("Failed to {what}")
    }))
}

/// `GET /api/health`
///
/// Reports this server's version and whether the record API answers.
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let status = check_health(&state.client, &state.api_url).await;
    if !status.is_connected() {
        log::warn!("Record API health check: {status}");
    }

    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: ApiBackendStatus {
            api_url: state.api_url.clone(),
            connected: status.is_connected(),
            message: status.to_string(),
        },
    })
}

/// `GET /api/categories`
///
/// Returns the location category legend, `Default` last.
pub async fn categories() -> HttpResponse {
    let legend: Vec<ApiCategory> = legend()
        .into_iter()
        .map(|(name, color)| ApiCategory {
            name,
            color: color.to_string(),
        })
        .collect();

    HttpResponse::Ok().json(legend)
}

/// `GET /api/layers/locations`
pub async fn location_layer(
    state: web::Data<AppState>,
    params: web::Query<LayerQueryParams>,
) -> HttpResponse {
    let filter = category_filter(params.categories.as_deref());

    match pipeline::location_features(&state, &filter).await {
        Ok(features) => HttpResponse::Ok().json(features),
        Err(e) => internal_error("load locations", &e),
    }
}

/// `GET /api/layers/suppliers`
pub async fn supplier_layer(state: web::Data<AppState>) -> HttpResponse {
    match pipeline::supplier_features(&state).await {
        Ok(features) => HttpResponse::Ok().json(features),
        Err(e) => internal_error("load suppliers", &e),
    }
}

/// `GET /api/need-scores`
///
/// Zip regions ranked by need score with their fill encoding.
pub async fn need_scores(state: web::Data<AppState>) -> HttpResponse {
    match pipeline::need_scores(&state).await {
        Ok(scores) => HttpResponse::Ok().json(ApiNeedScores::from(&scores)),
        Err(e) => internal_error("score zip regions", &e),
    }
}

/// `GET /api/zips/{geography}`
pub async fn zip_detail(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let geography = path.into_inner();

    match state.zips.get(geography.trim()).await {
        Ok(Some(region)) => HttpResponse::Ok().json(ApiZipDetail {
            need_score: need_score(&region),
            region,
        }),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("No zip region {geography}")
        })),
        Err(e) => internal_error("load zip region", &ServerError::from(e)),
    }
}

/// `GET /api/style`
///
/// A style fragment with the zip base layers and the requested overlays.
pub async fn style(
    state: web::Data<AppState>,
    params: web::Query<StyleQueryParams>,
) -> HttpResponse {
    let options = StyleOptions {
        filter: category_filter(params.categories.as_deref()),
        locations: params.locations.unwrap_or(true),
        suppliers: params.suppliers.unwrap_or(false),
        need: params.need.unwrap_or(false),
    };

    match pipeline::style_document(&state, &options).await {
        Ok(style) => HttpResponse::Ok().json(style),
        Err(e) => internal_error("build style", &e),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};

    use crate::routes;
    use crate::test_support::{FakeGeocoder, FakeStore, state};

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .configure(routes),
            )
            .await
        };
    }

    fn locations() -> FakeStore {
        FakeStore::with(vec![
            json!({ "_id": "a", "Name": "Garden A", "Category": "Garden", "latitude": 40.0, "longitude": -74.0 }),
            json!({ "_id": "b", "Name": "Shelter B", "Category": "Shelter", "Address": "1 Main St" }),
            json!({ "_id": "c", "Name": "Shelter C", "Category": "Shelter", "Address": "Nowhere" }),
        ])
    }

    fn geocoder() -> FakeGeocoder {
        FakeGeocoder::default().with("1 Main St", 40.1, -74.05)
    }

    #[actix_web::test]
    async fn categories_end_with_default() {
        let app = app!(state(FakeStore::default(), FakeStore::default(), FakeStore::default()));
        let req = test::TestRequest::get().uri("/api/categories").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 12);
        assert_eq!(entries.last().unwrap()["name"], json!("Default"));
    }

    #[actix_web::test]
    async fn location_layer_geocodes_then_filters() {
        let store = locations();
        let mut state = state(store.clone(), FakeStore::default(), FakeStore::default());
        state.geocoder = std::sync::Arc::new(geocoder());
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/layers/locations?categories=Shelter")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let features = body["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["id"], json!("b"));
        assert_eq!(features[0]["geometry"]["coordinates"], json!([-74.05, 40.1]));

        for _ in 0..50 {
            if !store.writes.lock().unwrap().is_empty() {
                break;
            }
            actix_web::rt::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(*store.writes.lock().unwrap(), vec!["b".to_string()]);
    }

    #[actix_web::test]
    async fn location_layer_without_filter_keeps_every_located_record() {
        let mut state = state(locations(), FakeStore::default(), FakeStore::default());
        state.geocoder = std::sync::Arc::new(geocoder());
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/layers/locations")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["features"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn store_failure_is_a_server_error() {
        let app = app!(state(
            FakeStore::failing(),
            FakeStore::failing(),
            FakeStore::failing()
        ));

        for uri in ["/api/layers/locations", "/api/layers/suppliers", "/api/need-scores"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        }
    }

    #[actix_web::test]
    async fn need_scores_are_ranked() {
        let zips = FakeStore::with(vec![
            json!({ "Geography": "07720", "tot_pop": 1000, "pct_food_insecure": 0.05 }),
            json!({
                "Geography": "07719",
                "tot_pop": 50000,
                "pct_food_insecure": 0.3,
                "pct_poverty": 0.2,
                "unemployment_rate": 0.1,
            }),
        ]);
        let app = app!(state(FakeStore::default(), FakeStore::default(), zips));

        let req = test::TestRequest::get().uri("/api/need-scores").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let regions = body["regions"].as_array().unwrap();
        assert_eq!(regions[0]["geography"], json!("07719"));
        let score = regions[0]["score"].as_f64().unwrap();
        assert!((score - 0.3312).abs() < 1e-3);
        assert_eq!(regions[0]["normalized"], json!(1.0));
    }

    #[actix_web::test]
    async fn zip_detail_is_found_or_404() {
        let zips = FakeStore::with(vec![json!({ "Geography": "08701", "County": "Ocean" })]);
        let app = app!(state(FakeStore::default(), FakeStore::default(), zips));

        let req = test::TestRequest::get().uri("/api/zips/08701").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["geography"], json!("08701"));
        assert_eq!(body["needScore"], json!(0.0));

        let req = test::TestRequest::get().uri("/api/zips/99999").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn style_carries_requested_overlays() {
        let suppliers = FakeStore::with(vec![json!({
            "_id": "s", "Identifier": "Farm", "latitude": 40.0, "longitude": -74.1,
        })]);
        let app = app!(state(locations(), suppliers, FakeStore::default()));

        let req = test::TestRequest::get()
            .uri("/api/style?locations=false&suppliers=true")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<&str> = body["layers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"suppliers-points"));
        assert!(!ids.contains(&"locations-points"));
    }

    #[actix_web::test]
    async fn health_reports_unreachable_backend() {
        let mut state = state(FakeStore::default(), FakeStore::default(), FakeStore::default());
        state.api_url = "http://127.0.0.1:9/api".to_string();
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], json!(true));
        assert_eq!(body["backend"]["connected"], json!(false));
    }
}
