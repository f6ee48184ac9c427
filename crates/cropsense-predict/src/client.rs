//! HTTP client for the prediction service.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use cropsense_models::{
    CropRecommendation, CropRecommendationRequest, CropsResponse, DiseaseDiagnosis, FarmReport,
    FarmReportRequest, LocationHierarchy, YieldPrediction, YieldPredictionRequest,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, Instrument};
use url::Url;
use validator::Validate;

use crate::error::{PredictError, PredictResult};
use crate::metrics::record_request;
use crate::service::{DiagnosisImage, PredictionService};

// =============================================================================
// Configuration
// =============================================================================

/// Prediction client configuration.
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    /// Service root; always ends in `/` so relative paths join below it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl PredictionConfig {
    pub fn new(base_url: &str, timeout: Duration) -> PredictResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, timeout })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Error body the service sends alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: String,
}

/// reqwest implementation of [`PredictionService`].
#[derive(Clone)]
pub struct PredictionClient {
    http: Client,
    config: PredictionConfig,
}

impl PredictionClient {
    pub fn new(config: PredictionConfig) -> PredictResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("cropsense-predict/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> PredictResult<Url> {
        Ok(self.config.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &'static str, path: &str) -> PredictResult<T> {
        let url = self.endpoint(path)?;
        self.execute(operation, self.http.get(url)).await
    }

    async fn post_json<B, T>(&self, operation: &'static str, path: &str, body: &B) -> PredictResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.execute(operation, self.http.post(url).json(body)).await
    }

    /// Send, record metrics and decode a JSON reply.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> PredictResult<T> {
        let span = info_span!("prediction_request", operation = %operation);
        let timeout = self.config.timeout;

        let start = Instant::now();
        let result: PredictResult<T> = async {
            let response = request.send().await.map_err(|e| map_send_error(e, timeout))?;
            let response = check_status(response).await?;
            let body = response.bytes().await.map_err(|e| map_send_error(e, timeout))?;
            serde_json::from_slice::<T>(&body)
                .map_err(|e| PredictError::invalid_response(format!("{operation}: {e}")))
        }
        .instrument(span)
        .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(502),
        };
        record_request(operation, status, latency_ms);
        debug!(operation, status, latency_ms, "Prediction request finished");

        result
    }
}

fn map_send_error(error: reqwest::Error, timeout: Duration) -> PredictError {
    if error.is_timeout() {
        PredictError::Timeout(timeout.as_secs())
    } else {
        PredictError::Network(error)
    }
}

async fn check_status(response: Response) -> PredictResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<UpstreamError>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("upstream error").to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });

    Err(PredictError::from_http_status(status.as_u16(), message))
}

fn validated<T: Validate>(value: T) -> PredictResult<T> {
    value
        .validate()
        .map_err(|e| PredictError::invalid_response(e.to_string()))?;
    Ok(value)
}

#[async_trait]
impl PredictionService for PredictionClient {
    async fn crops(&self) -> PredictResult<CropsResponse> {
        self.get_json("crops", "api/crops").await
    }

    async fn locations(&self) -> PredictResult<LocationHierarchy> {
        self.get_json("locations", "api/locations").await
    }

    async fn diagnose(&self, image: DiagnosisImage) -> PredictResult<DiseaseDiagnosis> {
        let url = self.endpoint("disease-diagnosis")?;
        let part = Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(&image.content_type)?;
        let form = Form::new().part("file", part);

        let diagnosis: DiseaseDiagnosis = self
            .execute("diagnose", self.http.post(url).multipart(form))
            .await?;
        validated(diagnosis)
    }

    async fn predict_yield(&self, request: &YieldPredictionRequest) -> PredictResult<YieldPrediction> {
        let prediction: YieldPrediction = self
            .post_json("predict_yield", "yield-prediction", request)
            .await?;
        validated(prediction)
    }

    async fn recommend_crops(
        &self,
        request: &CropRecommendationRequest,
    ) -> PredictResult<Vec<CropRecommendation>> {
        let recommendations: Vec<CropRecommendation> = self
            .post_json("recommend_crops", "crop-recommendation", request)
            .await?;
        recommendations.into_iter().map(validated).collect()
    }

    async fn farm_report(&self, request: &FarmReportRequest) -> PredictResult<FarmReport> {
        let report: FarmReport = self.post_json("farm_report", "farm-report", request).await?;
        validated(report)
    }

    async fn ping(&self) -> PredictResult<()> {
        let response = self
            .http
            .get(self.config.base_url.clone())
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?;

        if response.status().is_server_error() {
            return Err(PredictError::from_http_status(
                response.status().as_u16(),
                "health probe failed",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
