use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::VitalKind;

/// A single vital observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub patient_id: i64,
    pub kind: VitalKind,
    /// Systolic for blood pressure, the scalar for sugar.
    pub value1: f64,
    pub value2: Option<f64>, // diastolic for blood pressure
    pub recorded_at: NaiveDateTime,
}

impl Reading {
    /// Display form: "150/95" for blood pressure, "180" for sugar.
    pub fn formatted(&self) -> String {
        match (self.kind, self.value2) {
            (VitalKind::BloodPressure, Some(dia)) => format!("{}/{}", self.value1, dia),
            _ => format!("{}", self.value1),
        }
    }
}
