//! Prediction client error types.

use thiserror::Error;

/// Result type for prediction service calls.
pub type PredictResult<T> = Result<T, PredictError>;

/// Errors that can occur while talking to the prediction service.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid prediction service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Prediction service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Prediction service timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl PredictError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success upstream status.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            404 => Self::NotFound(message.into()),
            _ => Self::Status {
                status,
                message: message.into(),
            },
        }
    }

    /// Status code to record for this error, if it came from an HTTP reply.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Status { status, .. } => Some(*status),
            Self::Timeout(_) => Some(504),
            _ => None,
        }
    }
}
