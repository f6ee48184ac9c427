//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cropsense_media::MediaError;
use cropsense_models::RegionError;
use cropsense_predict::PredictError;
use cropsense_storage::StorageError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file part")]
    MissingFilePart,

    #[error("No selected file")]
    EmptyFilename,

    #[error("Invalid crop coordinates")]
    InvalidCropCoordinates { field: &'static str, value: String },

    #[error("Crop region out of bounds: {0}")]
    RegionOutOfBounds(String),

    #[error("Unreadable image")]
    UnreadableImage(String),

    #[error("Storage write failure: {0}")]
    StorageWriteFailure(String),

    #[error("{message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Prediction service unavailable")]
    PredictionUnavailable,

    #[error("Prediction service error: {0}")]
    Upstream(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFilePart
            | ApiError::EmptyFilename
            | ApiError::InvalidCropCoordinates { .. }
            | ApiError::RegionOutOfBounds(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UnreadableImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Multipart { status, .. } => *status,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PredictionUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::StorageWriteFailure(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingFilePart => "missing_file_part",
            ApiError::EmptyFilename => "empty_filename",
            ApiError::InvalidCropCoordinates { .. } => "invalid_crop_coordinates",
            ApiError::RegionOutOfBounds(_) => "region_out_of_bounds",
            ApiError::UnreadableImage(_) => "unreadable_image",
            ApiError::StorageWriteFailure(_) => "storage_write_failure",
            ApiError::Multipart { .. } => "invalid_multipart",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::PredictionUnavailable => "prediction_unavailable",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<RegionError> for ApiError {
    fn from(e: RegionError) -> Self {
        match e {
            RegionError::InvalidCoordinate { field, value } => {
                Self::InvalidCropCoordinates { field, value }
            }
            e @ RegionError::OutOfBounds { .. } => Self::RegionOutOfBounds(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(key) => Self::NotFound(key),
            StorageError::InvalidKey(key) => Self::NotFound(key),
            e @ (StorageError::WriteFailed { .. } | StorageError::Io(_)) => {
                Self::StorageWriteFailure(e.to_string())
            }
            e @ StorageError::ConfigError(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Region(e) => e.into(),
            MediaError::Storage(e) => e.into(),
            MediaError::UnreadableImage(reason) => Self::UnreadableImage(reason),
            e @ (MediaError::Io(_) | MediaError::EncodeFailed(_)) => {
                Self::StorageWriteFailure(e.to_string())
            }
            e @ (MediaError::FileNotFound(_) | MediaError::Internal(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::NotFound(msg) => Self::NotFound(msg),
            e => Self::Upstream(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_internal() {
            error!(code = self.code(), error = %self, "Request failed");
        } else {
            match &self {
                ApiError::InvalidCropCoordinates { field, value } => {
                    warn!(code = self.code(), field, value = %value, "Request rejected")
                }
                ApiError::UnreadableImage(reason) => {
                    warn!(code = self.code(), reason = %reason, "Request rejected")
                }
                _ => warn!(code = self.code(), error = %self, "Request rejected"),
            }
        }

        // Don't expose internal error details in production
        let detail = if self.is_internal()
            && std::env::var("ENVIRONMENT")
                .unwrap_or_default()
                .eq_ignore_ascii_case("production")
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}
