//! Client for the external crop prediction service.
//!
//! The service owns the ML models (disease classifier, yield regression,
//! crop recommender). This crate only speaks its JSON contracts:
//! - `PredictionService` trait, so the API can run with a stub or no service
//! - `PredictionClient`, the reqwest implementation
//! - Request metrics and tracing spans per upstream call

pub mod client;
pub mod error;
pub mod metrics;
pub mod service;

pub use client::{PredictionClient, PredictionConfig};
pub use error::{PredictError, PredictResult};
pub use service::{DiagnosisImage, PredictionService};
