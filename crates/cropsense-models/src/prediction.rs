//! JSON contracts of the external prediction service.
//!
//! The API crate forwards requests to the service and validates the replies
//! against these types before handing them back to the browser.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// `GET /api/crops`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropsResponse {
    pub crops: Vec<String>,
}

/// `GET /api/locations`: state name to its districts.
pub type LocationHierarchy = BTreeMap<String, Vec<String>>;

/// Reply of the disease classifier for a cropped leaf image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct DiseaseDiagnosis {
    pub disease: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    pub remedy: String,
    /// Public URL of the cropped image the diagnosis was made on
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct YieldPredictionRequest {
    #[validate(length(min = 1, message = "crop is required"))]
    pub crop: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct YieldPrediction {
    pub crop: String,
    pub predicted_yield_per_hectare: f64,
    pub unit: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub rainfall_stress: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Indian cropping seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[default]
    Kharif,
    Rabi,
    Zaid,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Kharif => "kharif",
            Season::Rabi => "rabi",
            Season::Zaid => "zaid",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_soil_type() -> String {
    "loamy".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CropRecommendationRequest {
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[serde(default = "default_soil_type")]
    pub soil_type: String,
    #[serde(default)]
    pub season: Season,
}

/// Agronomic averages for a crop. Anything the service adds beyond the
/// known fields (ranges, crop name) is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropRequirements {
    pub rainfall_avg: f64,
    pub temperature_avg: f64,
    pub ph_avg: f64,
    #[serde(rename = "N_avg")]
    pub n_avg: f64,
    #[serde(rename = "P_avg")]
    pub p_avg: f64,
    #[serde(rename = "K_avg")]
    pub k_avg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_avg: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CropRecommendation {
    pub crop: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub suitability_score: f64,
    pub requirements: CropRequirements,
}

fn default_language() -> String {
    "English".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct FarmReportRequest {
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub farm_info: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub seasonal_data: Value,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LocationAnalysis {
    pub district: String,
    pub state: String,
    pub annual_rainfall: f64,
    pub monsoon_rainfall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeasonPlan {
    pub months: String,
    pub rainfall: f64,
    pub suitable_crops: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeasonalPlanning {
    pub kharif: SeasonPlan,
    pub rabi: SeasonPlan,
    pub zaid: SeasonPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IrrigationAdvice {
    pub category: String,
    pub advice: String,
    pub water_conservation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[allow(non_snake_case)]
pub struct NpkRecommendation {
    pub N: String,
    pub P: String,
    pub K: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SoilManagement {
    pub npk_recommendation: NpkRecommendation,
    pub organic_matter: String,
    pub ph_management: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct FarmReport {
    pub location_analysis: LocationAnalysis,
    #[validate(nested)]
    pub recommended_crops: Vec<CropRecommendation>,
    pub seasonal_planning: SeasonalPlanning,
    pub irrigation_advice: IrrigationAdvice,
    pub soil_management: SoilManagement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}
