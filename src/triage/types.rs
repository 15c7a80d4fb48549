use serde::{Deserialize, Serialize};

use crate::adapters::DifferentialCandidate;
use crate::models::{CareDecision, Reading, RiskTier, VitalsRisk};

/// One triage submission from a health worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageInput {
    pub patient_id: i64,
    /// Overrides the age on the patient record when given.
    pub age: Option<u32>,
    pub chief_complaint: String,
    pub symptoms: Vec<String>,
    pub notes: String,
}

/// Latest readings and the derived vitals risk flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    pub latest_bp: Option<Reading>,
    pub latest_sugar: Option<Reading>,
    pub risk: VitalsRisk,
}

/// Where the final assessment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentSource {
    Inference,
    Fallback,
}

/// Final classifier output, persisted as a triage report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk: RiskTier,
    pub decision: CareDecision,
    pub reasoning: String,
    pub primary_diagnosis: String,
    pub asha_instructions: Vec<String>,
    pub home_remedies: Vec<String>,
    pub red_flags_to_watch: Vec<String>,
    pub differential_diagnosis: Vec<DifferentialCandidate>,
    pub detected_red_flags: Vec<String>,
    pub vitals_risk: VitalsRisk,
    pub source: AssessmentSource,
    /// True when a safety floor raised the returned tier.
    pub floor_applied: bool,
}
