use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A registered patient. `worker_id` is the assigned ASHA worker's phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub village: Option<String>,
    pub district: String,
    pub worker_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub village: Option<String>,
    /// Falls back to the store default when absent.
    pub district: Option<String>,
    pub worker_id: Option<String>,
}
