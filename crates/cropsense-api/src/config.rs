//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use cropsense_models::RegionPolicy;
use tracing::warn;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory holding uploads and derivatives
    pub upload_root: PathBuf,
    /// URL prefix the upload root is served under
    pub upload_public_prefix: String,
    /// What to do with crop regions outside the image
    pub region_policy: RegionPolicy,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (upload routes, per client IP)
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Key rate limits on `X-Forwarded-For`/`X-Real-IP`. Only safe behind a
    /// proxy that overwrites them.
    pub trust_proxy_headers: bool,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Base URL of the prediction service, if any
    pub prediction_service_url: Option<String>,
    /// Timeout for prediction service calls
    pub prediction_timeout: Duration,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_root: PathBuf::from("static/uploads"),
            upload_public_prefix: "uploads".to_string(),
            region_policy: RegionPolicy::Reject,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            trust_proxy_headers: false,
            request_timeout: Duration::from_secs(30),
            max_body_size: 4 * 1024 * 1024, // 4MB
            prediction_service_url: None,
            prediction_timeout: Duration::from_secs(10),
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            upload_root: std::env::var("UPLOAD_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_root),
            upload_public_prefix: std::env::var("UPLOAD_PUBLIC_PREFIX")
                .unwrap_or(defaults.upload_public_prefix),
            region_policy: std::env::var("CROP_REGION_POLICY")
                .ok()
                .and_then(|s| {
                    s.parse()
                        .map_err(|e| warn!("{}, falling back to {}", e, defaults.region_policy))
                        .ok()
                })
                .unwrap_or(defaults.region_policy),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_burst),
            trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.trust_proxy_headers),
            request_timeout: std::env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            prediction_service_url: std::env::var("PREDICTION_SERVICE_URL")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            prediction_timeout: std::env::var("PREDICTION_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.prediction_timeout),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
