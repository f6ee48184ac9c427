//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "cropsense_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "cropsense_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "cropsense_http_requests_in_flight";

    // Crop pipeline metrics
    pub const CROPS_TOTAL: &str = "cropsense_crops_total";
    pub const CROP_DURATION_SECONDS: &str = "cropsense_crop_duration_seconds";
    pub const UPLOAD_BYTES: &str = "cropsense_upload_bytes";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "cropsense_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished crop. `outcome` is `ok` or an error code.
pub fn record_crop(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::CROPS_TOTAL, &labels).increment(1);
    histogram!(names::CROP_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the size of a persisted upload.
pub fn record_upload_bytes(size_bytes: u64) {
    histogram!(names::UPLOAD_BYTES).record(size_bytes as f64);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

fn storage_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/(cropped_)?[0-9a-f]{32}(\.[a-z0-9]{1,8})?$").expect("valid storage key pattern")
    })
}

/// Sanitize path for metrics labels (collapse storage keys).
fn sanitize_path(path: &str) -> String {
    storage_key_pattern().replace(path, "/:key").into_owned()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
