use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{CareDecision, RiskTier};

/// One persisted triage episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    pub id: i64,
    pub patient_id: i64,
    pub chief_complaint: String,
    pub symptoms: Vec<String>,
    pub notes: Option<String>,
    pub risk: RiskTier,
    pub decision: CareDecision,
    /// Full assessment as JSON.
    pub result_json: String,
    pub created_at: NaiveDateTime,
}

/// Village with a cluster of recent high-risk reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub village: String,
    pub district: String,
    pub case_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTriageReport {
    pub patient_id: i64,
    pub chief_complaint: String,
    pub symptoms: Vec<String>,
    pub notes: Option<String>,
    pub risk: RiskTier,
    pub decision: CareDecision,
    pub result_json: String,
}
