//! Prediction service pass-through.
//!
//! Requests are validated here before they leave the process, replies are
//! validated by the client before they come back.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use cropsense_media::sniff_content_type;
use cropsense_models::{
    CropRecommendation, CropRecommendationRequest, CropsResponse, DiseaseDiagnosis, FarmReport,
    FarmReportRequest, LocationHierarchy, YieldPrediction, YieldPredictionRequest,
};
use cropsense_predict::DiagnosisImage;
use tracing::info;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::store_and_crop;
use crate::state::AppState;
use crate::upload::receive;

fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    let Json(body) = payload.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(e.body_text()),
        _ => ApiError::validation(e.body_text()),
    })?;
    body.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    Ok(body)
}

/// `GET /api/crops`
pub async fn list_crops(State(state): State<AppState>) -> ApiResult<Json<CropsResponse>> {
    let service = state.prediction_service()?;
    Ok(Json(service.crops().await?))
}

/// `GET /api/locations`
pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Json<LocationHierarchy>> {
    let service = state.prediction_service()?;
    Ok(Json(service.locations().await?))
}

/// `POST /disease-diagnosis`
///
/// Same form as `/crop`. The derivative is what gets classified, and the
/// reply links to it.
pub async fn disease_diagnosis(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DiseaseDiagnosis>> {
    let service = state.prediction_service()?;

    let upload = receive(multipart).await?;
    let result = store_and_crop(&state, upload).await?;

    let bytes = state.storage.read(&result.derived_key).await?;
    let content_type = sniff_content_type(&bytes)
        .unwrap_or_else(|| result.derived_key.content_type())
        .to_string();

    let mut diagnosis = service
        .diagnose(DiagnosisImage {
            filename: result.derived_key.to_string(),
            content_type,
            bytes,
        })
        .await?;
    diagnosis.image_url = result.derived_url;

    info!(
        key = %result.upload.key,
        disease = %diagnosis.disease,
        confidence = diagnosis.confidence,
        "Diagnosis complete"
    );
    Ok(Json(diagnosis))
}

/// `POST /yield-prediction`
pub async fn yield_prediction(
    State(state): State<AppState>,
    payload: Result<Json<YieldPredictionRequest>, JsonRejection>,
) -> ApiResult<Json<YieldPrediction>> {
    let request = validated(payload)?;
    let service = state.prediction_service()?;
    Ok(Json(service.predict_yield(&request).await?))
}

/// `POST /crop-recommendation`
pub async fn crop_recommendation(
    State(state): State<AppState>,
    payload: Result<Json<CropRecommendationRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<CropRecommendation>>> {
    let request = validated(payload)?;
    let service = state.prediction_service()?;
    Ok(Json(service.recommend_crops(&request).await?))
}

/// `POST /farm-report`
pub async fn farm_report(
    State(state): State<AppState>,
    payload: Result<Json<FarmReportRequest>, JsonRejection>,
) -> ApiResult<Json<FarmReport>> {
    let request = validated(payload)?;
    let service = state.prediction_service()?;
    Ok(Json(service.farm_report(&request).await?))
}
