use std::{collections::BTreeMap, fmt, str::FromStr};

use doctormate_directory::Enrichment;
use serde::{Deserialize, Deserializer, Serialize};

pub const SYMPTOMS_DISCLAIMER: &str = "This is an AI-generated assessment and not a substitute for professional medical advice. Please consult a healthcare provider for proper diagnosis and treatment.";
pub const SKIN_DISCLAIMER: &str = "This is an AI-generated assessment and not a substitute for professional medical advice. Please consult a dermatologist for proper diagnosis and treatment.";

/// Uniform success envelope returned by every analysis endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SymptomsRequest {
    pub symptoms: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Severity {
    #[default]
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mild" => Ok(Severity::Mild),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            other => Err(format!(
                "unknown severity '{other}', expected Mild, Moderate or Severe"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Converts a percentage to the integer range `[0, 100]`.
pub fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

fn deserialize_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Ok(clamp_percent(value))
}

fn default_disclaimer() -> String {
    SYMPTOMS_DISCLAIMER.to_string()
}

/// The fields shared by every diagnosis, whichever model produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub possible_diagnosis: String,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: u8,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub emergency_care: String,
    #[serde(default = "default_disclaimer")]
    pub disclaimer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymptomAnalysis {
    #[serde(flatten)]
    pub assessment: Assessment,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkinAdditionalInfo {
    pub diagnosis_code: String,
    pub risk_factors: Vec<String>,
    pub symptoms: Vec<String>,
    pub prognosis: String,
    pub treatment_options: Vec<String>,
    pub all_probabilities: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkinAnalysis {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub additional_info: SkinAdditionalInfo,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}
