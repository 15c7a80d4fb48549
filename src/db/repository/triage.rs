use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{format_ts, parse_enum, parse_ts, DatabaseError};
use crate::models::{Hotspot, NewTriageReport, RiskTier, TriageReport};

/// Append a triage report stamped at `now`.
pub fn insert_triage_report(
    conn: &Connection,
    report: &NewTriageReport,
    now: &NaiveDateTime,
) -> Result<i64, DatabaseError> {
    let symptoms_json =
        serde_json::to_string(&report.symptoms).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO triage_reports
         (patient_id, chief_complaint, symptoms, notes, risk_level, decision, result_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            report.patient_id,
            report.chief_complaint,
            symptoms_json,
            report.notes,
            report.risk.as_str(),
            report.decision.as_str(),
            report.result_json,
            format_ts(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_latest_triage_report(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<TriageReport>, DatabaseError> {
    conn.query_row(
        "SELECT id, patient_id, chief_complaint, symptoms, notes, risk_level, decision,
                result_json, created_at
         FROM triage_reports
         WHERE patient_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT 1",
        params![patient_id],
        row_to_report,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Triage reports since `since` for patients living in `village`
/// (trimmed, case-insensitive), optionally leaving out one report.
pub fn count_village_reports_since(
    conn: &Connection,
    village: &str,
    since: &NaiveDateTime,
    exclude_report: Option<i64>,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*)
         FROM triage_reports t
         JOIN patients p ON p.id = t.patient_id
         WHERE TRIM(p.village) = TRIM(?1) COLLATE NOCASE
           AND t.created_at >= ?2
           AND (?3 IS NULL OR t.id != ?3)",
        params![village, format_ts(since), exclude_report],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Villages with at least `min_cases` High/Critical reports since `since`.
pub fn get_hotspots(
    conn: &Connection,
    since: &NaiveDateTime,
    min_cases: i64,
) -> Result<Vec<Hotspot>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT TRIM(p.village) AS v, MIN(p.district), COUNT(*) AS cases
         FROM triage_reports t
         JOIN patients p ON p.id = t.patient_id
         WHERE t.created_at >= ?1
           AND t.risk_level IN (?2, ?3)
           AND p.village IS NOT NULL AND TRIM(p.village) != ''
         GROUP BY v COLLATE NOCASE
         HAVING COUNT(*) >= ?4
         ORDER BY cases DESC, v",
    )?;
    let rows = stmt.query_map(
        params![
            format_ts(since),
            RiskTier::High.as_str(),
            RiskTier::Critical.as_str(),
            min_cases,
        ],
        |row| {
            Ok(Hotspot {
                village: row.get(0)?,
                district: row.get(1)?,
                case_count: row.get(2)?,
            })
        },
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_report(row: &rusqlite::Row) -> Result<TriageReport, rusqlite::Error> {
    let symptoms: String = row.get(3)?;
    let risk: String = row.get(5)?;
    let decision: String = row.get(6)?;
    let created: String = row.get(8)?;
    Ok(TriageReport {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        chief_complaint: row.get(2)?,
        symptoms: serde_json::from_str(&symptoms).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        notes: row.get(4)?,
        risk: parse_enum(5, &risk)?,
        decision: parse_enum(6, &decision)?,
        result_json: row.get(7)?,
        created_at: parse_ts(8, &created)?,
    })
}
