//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    crop, crop_recommendation, disease_diagnosis, farm_report, health, index, list_crops,
    list_locations, ready, serve_upload, yield_prediction,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Routes that accept uploads do real work per request, so they are rate limited
    let upload_routes = Router::new()
        .route("/crop", post(crop))
        .route("/disease-diagnosis", post(disease_diagnosis))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let prediction_routes = Router::new()
        .route("/api/crops", get(list_crops))
        .route("/api/locations", get(list_locations))
        .route("/yield-prediction", post(yield_prediction))
        .route("/crop-recommendation", post(crop_recommendation))
        .route("/farm-report", post(farm_report));

    let static_routes = Router::new().route("/", get(index)).route(
        &format!("/{}/:key", state.storage.public_prefix()),
        get(serve_upload),
    );

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    Router::new()
        .merge(upload_routes)
        .merge(prediction_routes)
        .merge(static_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Extractors enforce the limit, so over-limit bodies get the JSON error shape
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout,
        ))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
