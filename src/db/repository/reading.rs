use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{format_ts, parse_enum, parse_ts, DatabaseError};
use crate::models::{Reading, VitalKind};

/// Append a reading. Readings are never updated or deleted.
pub fn insert_reading(
    conn: &Connection,
    patient_id: i64,
    kind: VitalKind,
    value1: f64,
    value2: Option<f64>,
    recorded_at: &NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO readings (patient_id, reading_type, value1, value2, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![patient_id, kind.as_str(), value1, value2, format_ts(recorded_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent reading of a kind for a patient.
pub fn get_latest_reading(
    conn: &Connection,
    patient_id: i64,
    kind: VitalKind,
) -> Result<Option<Reading>, DatabaseError> {
    conn.query_row(
        "SELECT id, patient_id, reading_type, value1, value2, recorded_at
         FROM readings
         WHERE patient_id = ?1 AND reading_type = ?2
         ORDER BY recorded_at DESC, id DESC
         LIMIT 1",
        params![patient_id, kind.as_str()],
        row_to_reading,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Readings of a kind recorded at or after `since`, oldest first.
pub fn get_readings_since(
    conn: &Connection,
    patient_id: i64,
    kind: VitalKind,
    since: &NaiveDateTime,
) -> Result<Vec<Reading>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, reading_type, value1, value2, recorded_at
         FROM readings
         WHERE patient_id = ?1 AND reading_type = ?2 AND recorded_at >= ?3
         ORDER BY recorded_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(
        params![patient_id, kind.as_str(), format_ts(since)],
        row_to_reading,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Patients with any reading at or after `since`.
pub fn get_patients_with_readings_since(
    conn: &Connection,
    since: &NaiveDateTime,
) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT patient_id FROM readings WHERE recorded_at >= ?1 ORDER BY patient_id",
    )?;
    let rows = stmt.query_map(params![format_ts(since)], |row| row.get::<_, i64>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_reading(row: &rusqlite::Row) -> Result<Reading, rusqlite::Error> {
    let kind: String = row.get(2)?;
    let recorded: String = row.get(5)?;
    Ok(Reading {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        kind: parse_enum(2, &kind)?,
        value1: row.get(3)?,
        value2: row.get(4)?,
        recorded_at: parse_ts(5, &recorded)?,
    })
}
