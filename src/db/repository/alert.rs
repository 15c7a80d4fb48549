use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::{format_ts, parse_enum, parse_ts, DatabaseError};
use crate::models::{NewAlert, PatientAlert, Severity};

/// Insert `alert` unless an unacknowledged alert for the same
/// (patient, vital_name) was created at or after `window_start`.
///
/// Check and insert are one statement, so two writers cannot both pass the
/// check. Returns the new id, or `None` when suppressed.
pub fn insert_alert_if_absent(
    conn: &Connection,
    alert: &NewAlert,
    now: &NaiveDateTime,
    window_start: &NaiveDateTime,
) -> Result<Option<i64>, DatabaseError> {
    if alert.severity == Severity::None {
        return Err(DatabaseError::ConstraintViolation(
            "alerts with severity NONE are not stored".into(),
        ));
    }
    let inserted = conn.execute(
        "INSERT INTO patient_alerts
         (patient_id, alert_type, severity, message, vital_name, trend_data, created_at)
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
         WHERE NOT EXISTS (
             SELECT 1 FROM patient_alerts
             WHERE patient_id = ?1 AND vital_name = ?5
               AND is_acknowledged = 0 AND created_at >= ?8
         )",
        params![
            alert.patient_id,
            alert.alert_type.as_str(),
            alert.severity.as_str(),
            alert.message,
            alert.vital_name,
            alert.trend_data,
            format_ts(now),
            format_ts(window_start),
        ],
    )?;
    if inserted == 0 {
        Ok(None)
    } else {
        Ok(Some(conn.last_insert_rowid()))
    }
}

/// Unacknowledged alerts for a patient, HIGH first, newest first.
pub fn get_open_alerts(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<PatientAlert>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, alert_type, severity, message, vital_name, trend_data,
                is_acknowledged, created_at, acknowledged_at, acknowledged_by
         FROM patient_alerts
         WHERE patient_id = ?1 AND is_acknowledged = 0
         ORDER BY CASE severity WHEN 'HIGH' THEN 0 ELSE 1 END, created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![patient_id], row_to_alert)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Acknowledge a patient's open alerts, all of them or one severity only.
/// Returns how many were acknowledged.
pub fn acknowledge_alerts(
    conn: &Connection,
    patient_id: i64,
    severity: Option<Severity>,
    actor: &str,
    now: &NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let affected = conn.execute(
        "UPDATE patient_alerts
         SET is_acknowledged = 1, acknowledged_at = ?1, acknowledged_by = ?2
         WHERE patient_id = ?3 AND is_acknowledged = 0
           AND (?4 IS NULL OR severity = ?4)",
        params![
            format_ts(now),
            actor,
            patient_id,
            severity.map(|s| s.as_str()),
        ],
    )?;
    Ok(affected)
}

fn row_to_alert(row: &rusqlite::Row) -> Result<PatientAlert, rusqlite::Error> {
    let alert_type: String = row.get(2)?;
    let severity: String = row.get(3)?;
    let created: String = row.get(8)?;
    let acknowledged_at: Option<String> = row.get(9)?;
    Ok(PatientAlert {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        alert_type: parse_enum(2, &alert_type)?,
        severity: parse_enum(3, &severity)?,
        message: row.get(4)?,
        vital_name: row.get(5)?,
        trend_data: row.get(6)?,
        acknowledged: row.get::<_, i32>(7)? != 0,
        created_at: parse_ts(8, &created)?,
        acknowledged_at: acknowledged_at.map(|s| parse_ts(9, &s)).transpose()?,
        acknowledged_by: row.get(10)?,
    })
}
