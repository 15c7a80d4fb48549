use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::messages::MessageTemplates;
use crate::config::OutbreakPolicy;
use crate::db::{count_village_reports_since, get_hotspots, insert_advisory_if_absent, DatabaseError};
use crate::models::{CareDecision, Hotspot, NewAdvisory};

/// Placeholder village recorded when registration did not capture one.
const UNKNOWN_VILLAGE: &str = "Unknown";

/// Payload returned when an advisory was raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutbreakAlert {
    pub advisory_id: i64,
    pub village: String,
    pub district: String,
    pub case_count: i64,
    pub urgency: String,
    pub message: String,
}

/// Count-based village clustering. Counts every triage report in the window
/// regardless of symptoms.
pub struct OutbreakDetector<'a> {
    policy: &'a OutbreakPolicy,
}

impl<'a> OutbreakDetector<'a> {
    pub fn new(policy: &'a OutbreakPolicy) -> Self {
        Self { policy }
    }

    /// Evaluate the village of a just-triaged patient.
    ///
    /// `exclude_report` is the in-flight report, which is counted as the
    /// "+1" instead of through the query.
    pub fn evaluate(
        &self,
        conn: &Connection,
        village: Option<&str>,
        district: &str,
        decision: CareDecision,
        exclude_report: Option<i64>,
        now: &NaiveDateTime,
    ) -> Result<Option<OutbreakAlert>, DatabaseError> {
        let Some(village) = village
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(UNKNOWN_VILLAGE))
        else {
            return Ok(None);
        };

        let since = *now - Duration::days(self.policy.window_days);
        let recent = count_village_reports_since(conn, village, &since, exclude_report)?;
        let case_count = recent + 1;
        if case_count < self.policy.case_threshold {
            return Ok(None);
        }

        let urgency = if decision == CareDecision::Emergency {
            "Critical"
        } else {
            "High"
        };
        let advisory = NewAdvisory {
            title: MessageTemplates::outbreak_title(village),
            message: MessageTemplates::outbreak_advisory(village, case_count),
            village: village.to_string(),
            district: district.to_string(),
            urgency: urgency.to_string(),
            case_count,
        };

        let window_start = *now - Duration::hours(self.policy.advisory_cooldown_hours);
        match insert_advisory_if_absent(conn, &advisory, now, &window_start)? {
            Some(advisory_id) => {
                tracing::warn!(
                    village = %village,
                    district = %district,
                    case_count,
                    advisory_id,
                    "Outbreak advisory issued"
                );
                Ok(Some(OutbreakAlert {
                    advisory_id,
                    village: advisory.village,
                    district: advisory.district,
                    case_count,
                    urgency: advisory.urgency,
                    message: MessageTemplates::outbreak_notice(village),
                }))
            }
            None => {
                tracing::debug!(village = %village, case_count, "Advisory suppressed, already sent in window");
                Ok(None)
            }
        }
    }

    /// Villages currently above threshold on High/Critical reports.
    pub fn hotspots(
        &self,
        conn: &Connection,
        now: &NaiveDateTime,
    ) -> Result<Vec<Hotspot>, DatabaseError> {
        let since = *now - Duration::days(self.policy.window_days);
        get_hotspots(conn, &since, self.policy.case_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{add_patient, ts};
    use crate::db::sqlite::open_memory_database;
    use crate::db::{get_advisories_for_village, insert_triage_report};
    use crate::models::{NewTriageReport, RiskTier};

    fn triage(conn: &Connection, patient_id: i64, risk: RiskTier, at: &str) -> i64 {
        insert_triage_report(
            conn,
            &NewTriageReport {
                patient_id,
                chief_complaint: "fever".into(),
                symptoms: vec!["fever".into()],
                notes: None,
                risk,
                decision: CareDecision::AshaFollowUp,
                result_json: "{}".into(),
            },
            &ts(at),
        )
        .unwrap()
    }

    #[test]
    fn two_recent_plus_current_raises_one_advisory() {
        let conn = open_memory_database().unwrap();
        let policy = OutbreakPolicy::default();
        let detector = OutbreakDetector::new(&policy);
        let a = add_patient(&conn, "A", "Udane", "w1");
        let b = add_patient(&conn, "B", "Udane", "w1");
        triage(&conn, a, RiskTier::High, "2026-03-04 10:00:00");
        triage(&conn, b, RiskTier::High, "2026-03-05 10:00:00");

        let now = ts("2026-03-06 10:00:00");
        let alert = detector
            .evaluate(&conn, Some("Udane"), "Dhule", CareDecision::AshaFollowUp, None, &now)
            .unwrap()
            .unwrap();
        assert_eq!(alert.case_count, 3);
        assert_eq!(alert.village, "Udane");
        assert_eq!(alert.urgency, "High");

        // more reports within 24h do not produce a second advisory
        triage(&conn, a, RiskTier::High, "2026-03-06 11:00:00");
        let again = detector
            .evaluate(&conn, Some("udane"), "Dhule", CareDecision::Emergency, None, &ts("2026-03-06 12:00:00"))
            .unwrap();
        assert!(again.is_none());
        assert_eq!(get_advisories_for_village(&conn, "Udane").unwrap().len(), 1);
    }

    #[test]
    fn below_threshold_is_quiet() {
        let conn = open_memory_database().unwrap();
        let policy = OutbreakPolicy::default();
        let a = add_patient(&conn, "A", "Udane", "w1");
        triage(&conn, a, RiskTier::High, "2026-03-05 10:00:00");
        // old report outside the 7-day window
        triage(&conn, a, RiskTier::High, "2026-02-20 10:00:00");

        let result = OutbreakDetector::new(&policy)
            .evaluate(&conn, Some("Udane"), "Dhule", CareDecision::Emergency, None, &ts("2026-03-06 10:00:00"))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn in_flight_report_is_not_double_counted() {
        let conn = open_memory_database().unwrap();
        let policy = OutbreakPolicy::default();
        let a = add_patient(&conn, "A", "Udane", "w1");
        triage(&conn, a, RiskTier::High, "2026-03-05 10:00:00");
        let current = triage(&conn, a, RiskTier::High, "2026-03-06 10:00:00");

        let result = OutbreakDetector::new(&policy)
            .evaluate(&conn, Some("Udane"), "Dhule", CareDecision::Emergency, Some(current), &ts("2026-03-06 10:00:00"))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn missing_village_is_noop() {
        let conn = open_memory_database().unwrap();
        let policy = OutbreakPolicy::default();
        let detector = OutbreakDetector::new(&policy);
        let now = ts("2026-03-06 10:00:00");
        assert!(detector.evaluate(&conn, None, "Dhule", CareDecision::Emergency, None, &now).unwrap().is_none());
        assert!(detector.evaluate(&conn, Some("  "), "Dhule", CareDecision::Emergency, None, &now).unwrap().is_none());
    }

    #[test]
    fn unknown_village_is_noop() {
        let conn = open_memory_database().unwrap();
        let policy = OutbreakPolicy::default();
        let detector = OutbreakDetector::new(&policy);
        for i in 0..3 {
            let p = add_patient(&conn, &format!("P{i}"), "Unknown", "w1");
            triage(&conn, p, RiskTier::High, "2026-03-06 08:00:00");
        }
        let now = ts("2026-03-06 10:00:00");
        for village in ["Unknown", "unknown", " UNKNOWN "] {
            let result = detector
                .evaluate(&conn, Some(village), "Dhule", CareDecision::Emergency, None, &now)
                .unwrap();
            assert!(result.is_none());
        }
        assert!(get_advisories_for_village(&conn, "Unknown").unwrap().is_empty());
    }

    #[test]
    fn padded_village_names_are_counted() {
        let conn = open_memory_database().unwrap();
        let policy = OutbreakPolicy::default();
        let a = add_patient(&conn, "A", "Udane ", "w1");
        let b = add_patient(&conn, "B", " udane", "w1");
        triage(&conn, a, RiskTier::High, "2026-03-05 10:00:00");
        triage(&conn, b, RiskTier::High, "2026-03-05 11:00:00");

        let alert = OutbreakDetector::new(&policy)
            .evaluate(&conn, Some("Udane "), "Dhule", CareDecision::AshaFollowUp, None, &ts("2026-03-06 10:00:00"))
            .unwrap()
            .unwrap();
        assert_eq!(alert.case_count, 3);
        assert_eq!(alert.village, "Udane");
    }

    #[test]
    fn emergency_decision_sets_critical_urgency() {
        let conn = open_memory_database().unwrap();
        let policy = OutbreakPolicy {
            case_threshold: 1,
            ..OutbreakPolicy::default()
        };
        let alert = OutbreakDetector::new(&policy)
            .evaluate(&conn, Some("Sakri"), "Dhule", CareDecision::Emergency, None, &ts("2026-03-06 10:00:00"))
            .unwrap()
            .unwrap();
        assert_eq!(alert.urgency, "Critical");
    }

    #[test]
    fn hotspots_use_policy_threshold() {
        let conn = open_memory_database().unwrap();
        let policy = OutbreakPolicy::default();
        for i in 0..3 {
            let p = add_patient(&conn, &format!("P{i}"), "Udane", "w1");
            triage(&conn, p, RiskTier::High, "2026-03-05 10:00:00");
        }
        let spots = OutbreakDetector::new(&policy).hotspots(&conn, &ts("2026-03-06 10:00:00")).unwrap();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].case_count, 3);
    }
}
