use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::{UrgencyWeights, VitalThresholds};
use crate::db::{
    get_earliest_overdue_followup, get_latest_reading, get_open_alerts, has_escalated_workflow,
    DatabaseError,
};
use crate::models::{PriorityLevel, Severity, VitalKind};

/// Everything the scorer looks at for one patient, gathered up front so
/// scoring itself stays pure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrgencyInputs {
    /// Severities of unacknowledged alerts, most severe first.
    pub alert_severities: Vec<Severity>,
    pub top_alert_message: Option<String>,
    pub overdue_days: Option<i64>,
    pub latest_systolic: Option<f64>,
    pub latest_diastolic: Option<f64>,
    pub latest_sugar: Option<f64>,
    pub pending_triage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyScore {
    pub score: u32,
    pub level: PriorityLevel,
    /// Human-readable reasons to visit, in display order.
    pub reasons: Vec<String>,
}

impl UrgencyScore {
    pub fn needs_attention(&self) -> bool {
        self.score > 0
    }

    pub fn visit_reason(&self) -> String {
        if self.reasons.is_empty() {
            "Routine check".to_string()
        } else {
            self.reasons.join(" | ")
        }
    }
}

/// Read a patient's urgency inputs as of `now`.
pub fn collect_inputs(
    conn: &Connection,
    patient_id: i64,
    now: &NaiveDateTime,
) -> Result<UrgencyInputs, DatabaseError> {
    let alerts = get_open_alerts(conn, patient_id)?;
    let today = now.date();
    let overdue = get_earliest_overdue_followup(conn, patient_id, &today)?;
    let bp = get_latest_reading(conn, patient_id, VitalKind::BloodPressure)?;
    let sugar = get_latest_reading(conn, patient_id, VitalKind::BloodSugar)?;

    Ok(UrgencyInputs {
        alert_severities: alerts.iter().map(|a| a.severity).collect(),
        top_alert_message: alerts.first().map(|a| a.message.clone()),
        overdue_days: overdue.map(|f| (today - f.scheduled_date).num_days()),
        latest_systolic: bp.as_ref().map(|r| r.value1),
        latest_diastolic: bp.as_ref().and_then(|r| r.value2),
        latest_sugar: sugar.map(|r| r.value1),
        pending_triage: has_escalated_workflow(conn, patient_id)?,
    })
}

/// Additive 0..=max_score composite. Clamped once, after every term is added.
pub fn score_urgency(
    inputs: &UrgencyInputs,
    weights: &UrgencyWeights,
    thresholds: &VitalThresholds,
) -> UrgencyScore {
    let mut score: u32 = 0;
    let mut reasons = Vec::new();

    for severity in &inputs.alert_severities {
        score = score.saturating_add(match severity {
            Severity::High => weights.high_alert,
            Severity::Moderate => weights.moderate_alert,
            Severity::None => 0,
        });
    }
    if let Some(message) = &inputs.top_alert_message {
        reasons.push(message.clone());
    }

    if let Some(days) = inputs.overdue_days {
        let days = days.max(0) as u32;
        let overdue = weights
            .overdue_base
            .saturating_add(weights.overdue_per_day.saturating_mul(days))
            .min(weights.overdue_cap);
        score = score.saturating_add(overdue);
        reasons.push(format!("Follow-up overdue by {days} days"));
    }

    let high_bp = inputs
        .latest_systolic
        .filter(|s| *s >= thresholds.critical_systolic);
    let high_sugar = inputs.latest_sugar.filter(|s| *s >= thresholds.critical_sugar);
    if high_bp.is_some() || high_sugar.is_some() {
        score = score.saturating_add(weights.critical_vitals);
    }
    if let Some(systolic) = high_bp {
        match inputs.latest_diastolic {
            Some(diastolic) => reasons.push(format!("High BP: {systolic}/{diastolic}")),
            None => reasons.push(format!("High BP: {systolic}")),
        }
    }
    if let Some(sugar) = high_sugar {
        reasons.push(format!("High Sugar: {sugar} mg/dL"));
    }

    if inputs.pending_triage {
        score = score.saturating_add(weights.pending_triage);
    }

    let score = score.min(weights.max_score);
    UrgencyScore {
        score,
        level: priority_level(score, weights),
        reasons,
    }
}

pub fn priority_level(score: u32, weights: &UrgencyWeights) -> PriorityLevel {
    if score >= weights.high_level {
        PriorityLevel::High
    } else if score >= weights.moderate_level {
        PriorityLevel::Moderate
    } else {
        PriorityLevel::Low
    }
}
