use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Village-level public-health notice raised by the outbreak detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub village: String,
    pub district: String,
    pub urgency: String,
    pub case_count: i64,
    pub sent_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdvisory {
    pub title: String,
    pub message: String,
    pub village: String,
    pub district: String,
    pub urgency: String,
    pub case_count: i64,
}
