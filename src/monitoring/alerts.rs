use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use super::messages::MessageTemplates;
use super::trend::TrendResult;
use crate::config::AlertPolicy;
use crate::db::{insert_alert_if_absent, DatabaseError};
use crate::models::{AlertType, NewAlert, RiskTier, Severity, TrendDirection};

pub const TRIAGE_CATEGORY: &str = "TRIAGE";
pub const SOS_CATEGORY: &str = "SOS";

/// Creates deduplicated patient alerts. At most one unacknowledged alert
/// per (patient, vital or category) exists inside the dedup window.
pub struct AlertManager<'a> {
    policy: &'a AlertPolicy,
}

impl<'a> AlertManager<'a> {
    pub fn new(policy: &'a AlertPolicy) -> Self {
        Self { policy }
    }

    /// Alert for a trend result. No-op for severity NONE.
    pub fn raise_trend(
        &self,
        conn: &Connection,
        patient_id: i64,
        trend: &TrendResult,
        now: &NaiveDateTime,
    ) -> Result<Option<i64>, DatabaseError> {
        if !trend.is_actionable() {
            return Ok(None);
        }
        let trend_data = match serde_json::to_string(trend) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::warn!(
                    patient_id,
                    vital = trend.kind.as_str(),
                    error = %e,
                    "Trend data not serializable, storing alert without it"
                );
                None
            }
        };
        let alert = NewAlert {
            patient_id,
            alert_type: if trend.direction == TrendDirection::Rising {
                AlertType::VitalTrendWorsening
            } else {
                AlertType::VitalTrendImproving
            },
            severity: trend.severity,
            message: MessageTemplates::vital_trend(
                trend.kind,
                trend.direction,
                trend.magnitude,
                trend.span_days,
            ),
            vital_name: trend.kind.as_str().to_string(),
            trend_data,
        };
        self.create(conn, &alert, now)
    }

    /// Alert for a triage outcome. Critical maps to HIGH, High to MODERATE;
    /// lower tiers are a no-op.
    pub fn raise_triage(
        &self,
        conn: &Connection,
        patient_id: i64,
        risk: RiskTier,
        primary_diagnosis: &str,
        now: &NaiveDateTime,
    ) -> Result<Option<i64>, DatabaseError> {
        let severity = triage_severity(risk);
        if severity == Severity::None {
            return Ok(None);
        }
        let alert = NewAlert {
            patient_id,
            alert_type: AlertType::TriageRisk,
            severity,
            message: MessageTemplates::triage_risk(primary_diagnosis),
            vital_name: TRIAGE_CATEGORY.to_string(),
            trend_data: None,
        };
        self.create(conn, &alert, now)
    }

    pub fn raise_sos(
        &self,
        conn: &Connection,
        patient_id: i64,
        now: &NaiveDateTime,
    ) -> Result<Option<i64>, DatabaseError> {
        let alert = NewAlert {
            patient_id,
            alert_type: AlertType::SosTriggered,
            severity: Severity::High,
            message: MessageTemplates::sos(),
            vital_name: SOS_CATEGORY.to_string(),
            trend_data: None,
        };
        self.create(conn, &alert, now)
    }

    fn create(
        &self,
        conn: &Connection,
        alert: &NewAlert,
        now: &NaiveDateTime,
    ) -> Result<Option<i64>, DatabaseError> {
        let window_start = *now - Duration::hours(self.policy.dedup_window_hours);
        let created = insert_alert_if_absent(conn, alert, now, &window_start)?;
        match created {
            Some(id) => tracing::info!(
                patient_id = alert.patient_id,
                alert_id = id,
                vital = %alert.vital_name,
                severity = alert.severity.as_str(),
                "Alert created"
            ),
            None => tracing::debug!(
                patient_id = alert.patient_id,
                vital = %alert.vital_name,
                "Alert suppressed, open alert exists in window"
            ),
        }
        Ok(created)
    }
}

pub fn triage_severity(risk: RiskTier) -> Severity {
    match risk {
        RiskTier::Critical => Severity::High,
        RiskTier::High => Severity::Moderate,
        RiskTier::Moderate | RiskTier::Low => Severity::None,
    }
}
