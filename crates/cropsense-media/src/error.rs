//! Error types for media operations.

use std::path::PathBuf;

use cropsense_models::RegionError;
use cropsense_storage::StorageError;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while cropping an image.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Unreadable image: {0}")]
    UnreadableImage(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self::UnreadableImage(message.into())
    }

    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::EncodeFailed(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
