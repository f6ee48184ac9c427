//! The prediction service seam.

use async_trait::async_trait;
use cropsense_models::{
    CropRecommendation, CropRecommendationRequest, CropsResponse, DiseaseDiagnosis, FarmReport,
    FarmReportRequest, LocationHierarchy, YieldPrediction, YieldPredictionRequest,
};

use crate::error::PredictResult;

/// An image sent for disease classification.
#[derive(Debug, Clone)]
pub struct DiagnosisImage {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Operations offered by the prediction service.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Crops the models know about.
    async fn crops(&self) -> PredictResult<CropsResponse>;

    /// States and their districts.
    async fn locations(&self) -> PredictResult<LocationHierarchy>;

    /// Classify a (cropped) leaf image. `image_url` in the reply is left for
    /// the caller to fill in.
    async fn diagnose(&self, image: DiagnosisImage) -> PredictResult<DiseaseDiagnosis>;

    async fn predict_yield(&self, request: &YieldPredictionRequest) -> PredictResult<YieldPrediction>;

    async fn recommend_crops(
        &self,
        request: &CropRecommendationRequest,
    ) -> PredictResult<Vec<CropRecommendation>>;

    async fn farm_report(&self, request: &FarmReportRequest) -> PredictResult<FarmReport>;

    /// Cheap reachability probe for readiness checks.
    async fn ping(&self) -> PredictResult<()>;
}
