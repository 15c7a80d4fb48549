use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::{AlertType, Severity};

/// A standing patient-level notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientAlert {
    pub id: i64,
    pub patient_id: i64,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    /// "BP", "SUGAR", or a synthetic category such as "TRIAGE" / "SOS".
    pub vital_name: String,
    pub trend_data: Option<String>,
    pub acknowledged: bool,
    pub created_at: NaiveDateTime,
    pub acknowledged_at: Option<NaiveDateTime>,
    pub acknowledged_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    pub patient_id: i64,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub vital_name: String,
    pub trend_data: Option<String>,
}
