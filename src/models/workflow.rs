use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{WorkflowState, WorkflowStatus};

/// One care episode for a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareWorkflow {
    pub id: i64,
    pub patient_id: i64,
    pub state: WorkflowState,
    pub next_action: String,
    pub status: WorkflowStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}
