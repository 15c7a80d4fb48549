use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::{FollowUpStatus, TaskPriority};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: i64,
    pub patient_id: i64,
    pub scheduled_date: NaiveDate,
    pub visit_type: String,
    pub priority: TaskPriority,
    pub status: FollowUpStatus,
    pub created_by: String,
    pub notes: Option<String>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFollowUp {
    pub patient_id: i64,
    pub scheduled_date: NaiveDate,
    pub visit_type: String,
    pub priority: TaskPriority,
    pub created_by: String,
    pub notes: Option<String>,
}
