//! Axum HTTP server for the CropSense image service.
//!
//! This crate provides:
//! - `POST /crop`: multipart upload, region parsing and cropping
//! - Read-only serving of stored originals and derivatives
//! - Typed pass-through to the external prediction service
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod render;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
