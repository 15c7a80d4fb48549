use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::urgency::{collect_inputs, score_urgency, UrgencyScore};
use crate::config::{RosterConfig, UrgencyWeights, VitalThresholds};
use crate::db::{get_patients_for_worker, DatabaseError};
use crate::models::PriorityLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub patient_id: i64,
    pub name: String,
    pub village: Option<String>,
    pub urgency: UrgencyScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub sequence: usize,
    pub patient_id: i64,
    pub patient_name: String,
    pub village: Option<String>,
    pub priority: PriorityLevel,
    pub reason: String,
}

/// Visit order by priority with a flat per-visit time estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRoute {
    pub stops: Vec<RouteStop>,
    pub total_minutes: u32,
}

impl VisitRoute {
    pub fn estimated_hours(&self) -> f64 {
        f64::from(self.total_minutes) / 60.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRoster {
    pub worker_id: String,
    pub generated_at: NaiveDateTime,
    /// Patients needing attention today, most urgent first.
    pub patients: Vec<RosterEntry>,
    pub high_priority: usize,
    pub moderate_priority: usize,
    pub low_priority: usize,
    pub route: VisitRoute,
    /// Patients whose inputs could not be read.
    pub failed: Vec<(i64, String)>,
}

/// Score every patient assigned to `worker_id` and rank those needing a visit.
///
/// A patient whose data cannot be read is logged, listed in `failed` and
/// left off the roster; the rest are still ranked.
pub fn build_roster(
    conn: &Connection,
    worker_id: &str,
    weights: &UrgencyWeights,
    thresholds: &VitalThresholds,
    config: &RosterConfig,
    now: &NaiveDateTime,
) -> Result<DailyRoster, DatabaseError> {
    let patients = get_patients_for_worker(conn, worker_id)?;

    let mut entries = Vec::new();
    let mut failed = Vec::new();
    for patient in patients {
        let inputs = match collect_inputs(conn, patient.id, now) {
            Ok(inputs) => inputs,
            Err(e) => {
                tracing::warn!(patient_id = patient.id, error = %e, "Urgency inputs unavailable, skipping");
                failed.push((patient.id, e.to_string()));
                continue;
            }
        };
        let urgency = score_urgency(&inputs, weights, thresholds);
        if !urgency.needs_attention() {
            continue;
        }
        entries.push(RosterEntry {
            patient_id: patient.id,
            name: patient.name,
            village: patient.village,
            urgency,
        });
    }

    // Stable: ties keep name order from the query.
    entries.sort_by(|a, b| b.urgency.score.cmp(&a.urgency.score));

    let count = |level: PriorityLevel| entries.iter().filter(|e| e.urgency.level == level).count();
    let (high, moderate, low) = (
        count(PriorityLevel::High),
        count(PriorityLevel::Moderate),
        count(PriorityLevel::Low),
    );
    let route = suggest_route(&entries, config.minutes_per_visit);

    tracing::info!(
        worker_id,
        patients = entries.len(),
        high,
        moderate,
        low,
        "Daily roster generated"
    );

    Ok(DailyRoster {
        worker_id: worker_id.to_string(),
        generated_at: *now,
        patients: entries,
        high_priority: high,
        moderate_priority: moderate,
        low_priority: low,
        route,
        failed,
    })
}

pub fn suggest_route(entries: &[RosterEntry], minutes_per_visit: u32) -> VisitRoute {
    let stops: Vec<RouteStop> = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| RouteStop {
            sequence: idx + 1,
            patient_id: entry.patient_id,
            patient_name: entry.name.clone(),
            village: entry.village.clone(),
            priority: entry.urgency.level,
            reason: entry.urgency.visit_reason(),
        })
        .collect();
    let total_minutes = minutes_per_visit.saturating_mul(stops.len() as u32);
    VisitRoute {
        stops,
        total_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{add_patient, ts};
    use crate::db::sqlite::open_memory_database;
    use crate::db::{insert_alert_if_absent, insert_reading};
    use crate::models::{AlertType, NewAlert, Severity, VitalKind};

    fn alert(conn: &Connection, patient_id: i64, severity: Severity, vital: &str) {
        insert_alert_if_absent(
            conn,
            &NewAlert {
                patient_id,
                alert_type: AlertType::VitalTrendWorsening,
                severity,
                message: format!("{vital} worsening"),
                vital_name: vital.into(),
                trend_data: None,
            },
            &ts("2026-03-10 06:00:00"),
            &ts("2026-03-09 06:00:00"),
        )
        .unwrap();
    }

    fn roster(conn: &Connection, worker: &str) -> DailyRoster {
        build_roster(
            conn,
            worker,
            &UrgencyWeights::default(),
            &VitalThresholds::default(),
            &RosterConfig::default(),
            &ts("2026-03-10 09:00:00"),
        )
        .unwrap()
    }

    #[test]
    fn ranks_and_excludes_zero_scores() {
        let conn = open_memory_database().unwrap();
        let anita = add_patient(&conn, "Anita", "Udane", "w1");
        let bhim = add_patient(&conn, "Bhim", "Udane", "w1");
        let _calm = add_patient(&conn, "Chandra", "Udane", "w1");
        let devi = add_patient(&conn, "Devi", "Udane", "w1");
        let _other = add_patient(&conn, "Other", "Udane", "w2");

        alert(&conn, anita, Severity::Moderate, "BP");
        alert(&conn, bhim, Severity::High, "BP");
        alert(&conn, bhim, Severity::Moderate, "SUGAR");
        insert_reading(&conn, devi, VitalKind::BloodSugar, 260.0, None, &ts("2026-03-10 07:00:00"))
            .unwrap();

        let r = roster(&conn, "w1");
        let ids: Vec<i64> = r.patients.iter().map(|e| e.patient_id).collect();
        assert_eq!(ids, vec![bhim, anita, devi]);
        assert_eq!(r.patients[0].urgency.score, 80);
        assert_eq!((r.high_priority, r.moderate_priority, r.low_priority), (1, 1, 1));
        assert!(r.failed.is_empty());

        assert_eq!(r.route.stops.len(), 3);
        assert_eq!(r.route.stops[0].sequence, 1);
        assert_eq!(r.route.stops[2].reason, "High Sugar: 260 mg/dL");
        assert_eq!(r.route.total_minutes, 90);
        assert!((r.route.estimated_hours() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_keep_name_order() {
        let conn = open_memory_database().unwrap();
        let zoya = add_patient(&conn, "Zoya", "Udane", "w1");
        let amit = add_patient(&conn, "Amit", "Udane", "w1");
        alert(&conn, zoya, Severity::Moderate, "BP");
        alert(&conn, amit, Severity::Moderate, "BP");

        let r = roster(&conn, "w1");
        let ids: Vec<i64> = r.patients.iter().map(|e| e.patient_id).collect();
        assert_eq!(ids, vec![amit, zoya]);
    }

    #[test]
    fn unknown_worker_gets_empty_roster() {
        let conn = open_memory_database().unwrap();
        let r = roster(&conn, "nobody");
        assert!(r.patients.is_empty());
        assert_eq!(r.route.total_minutes, 0);
    }
}
