//! Application state.

use std::sync::Arc;

use cropsense_predict::{PredictionClient, PredictionConfig, PredictionService};
use cropsense_storage::StorageRoot;
use tracing::info;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{create_rate_limiter, IpRateLimiter};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<StorageRoot>,
    pub predictions: Option<Arc<dyn PredictionService>>,
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    /// Create application state, preparing the upload root.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let storage = StorageRoot::new(&config.upload_root, &config.upload_public_prefix);
        storage.init().await?;

        let predictions: Option<Arc<dyn PredictionService>> = match &config.prediction_service_url {
            Some(url) => {
                let client = PredictionClient::new(PredictionConfig::new(url, config.prediction_timeout)?)?;
                info!("Prediction service at {}", client.base_url());
                Some(Arc::new(client))
            }
            None => {
                info!("PREDICTION_SERVICE_URL not set, prediction routes will answer 503");
                None
            }
        };

        Ok(Self::with_services(config, storage, predictions))
    }

    /// Assemble state from already constructed parts.
    pub fn with_services(
        config: ApiConfig,
        storage: StorageRoot,
        predictions: Option<Arc<dyn PredictionService>>,
    ) -> Self {
        let rate_limiter = create_rate_limiter(config.rate_limit_rps, config.rate_limit_burst);
        Self {
            config,
            storage: Arc::new(storage),
            predictions,
            rate_limiter,
        }
    }

    /// The prediction service, or `PredictionUnavailable` if none is configured.
    pub fn prediction_service(&self) -> ApiResult<&dyn PredictionService> {
        self.predictions
            .as_deref()
            .ok_or(ApiError::PredictionUnavailable)
    }
}
