//! Shared data models for the CropSense image service.
//!
//! This crate provides Serde-serializable types for:
//! - Crop regions and the geometric policy applied to them
//! - Raw region form fields as received from clients
//! - JSON contracts of the external prediction service

pub mod prediction;
pub mod region;

// Re-export common types
pub use prediction::{
    CropRecommendation, CropRecommendationRequest, CropRequirements, CropsResponse,
    DiseaseDiagnosis, FarmReport, FarmReportRequest, IrrigationAdvice, LocationAnalysis,
    LocationHierarchy, NpkRecommendation, Season, SeasonPlan, SeasonalPlanning, SoilManagement,
    YieldPrediction, YieldPredictionRequest,
};
pub use region::{
    CropRegion, PixelRect, RegionError, RegionFields, RegionPolicy, RegionPolicyParseError,
    REGION_FIELD_NAMES,
};
