use serde::{Deserialize, Serialize};

use super::InferenceError;
use crate::models::{CareDecision, RiskTier, VitalsRisk};

/// One ranked candidate from the differential classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialCandidate {
    pub disease: String,
    /// In [0, 1].
    pub confidence: f64,
}

/// Context sent to the reasoning service for one triage episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub age: Option<u32>,
    pub chief_complaint: String,
    pub symptoms: Vec<String>,
    pub notes: String,
    /// Formatted latest readings, `None` when never measured.
    pub latest_bp: Option<String>,
    pub latest_sugar: Option<String>,
    pub vitals_risk: VitalsRisk,
    pub differential: Vec<DifferentialCandidate>,
    pub red_flags: Vec<String>,
    /// Locale-appropriate home-remedy reference text.
    pub reference_text: String,
}

/// Structured answer from the reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub risk: RiskTier,
    pub decision: CareDecision,
    pub reasoning: String,
    pub primary_diagnosis: Option<String>,
    pub asha_instructions: Vec<String>,
    pub home_remedies: Vec<String>,
    pub red_flags_to_watch: Vec<String>,
}

/// Natural-language reasoning service producing a structured assessment.
///
/// Implementations must bound their own latency; callers make exactly one
/// attempt and fall back on any error.
pub trait DiagnosticInference: Send + Sync {
    fn assess(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError>;
}

/// Symptom-text classifier returning ranked disease candidates.
/// An empty list means no local model is available; it is not an error.
pub trait DifferentialDiagnosis: Send + Sync {
    fn rank(&self, symptom_text: &str, top_n: usize) -> Vec<DifferentialCandidate>;
}
