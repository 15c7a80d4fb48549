use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{format_date, format_ts, parse_date, parse_enum, parse_ts, DatabaseError};
use crate::models::{FollowUp, NewFollowUp};

pub fn insert_followup(
    conn: &Connection,
    followup: &NewFollowUp,
    now: &NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO follow_up_schedule
         (patient_id, scheduled_date, visit_type, priority, status, created_by, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?6, ?7)",
        params![
            followup.patient_id,
            format_date(&followup.scheduled_date),
            followup.visit_type,
            followup.priority.as_str(),
            followup.created_by,
            followup.notes,
            format_ts(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Earliest PENDING entry scheduled strictly before `today`.
pub fn get_earliest_overdue_followup(
    conn: &Connection,
    patient_id: i64,
    today: &NaiveDate,
) -> Result<Option<FollowUp>, DatabaseError> {
    conn.query_row(
        "SELECT id, patient_id, scheduled_date, visit_type, priority, status, created_by,
                notes, completed_at, created_at
         FROM follow_up_schedule
         WHERE patient_id = ?1 AND status = 'PENDING' AND scheduled_date < ?2
         ORDER BY scheduled_date ASC, id ASC
         LIMIT 1",
        params![patient_id, format_date(today)],
        row_to_followup,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// PENDING entries for a patient, soonest first.
pub fn get_pending_followups(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<FollowUp>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, scheduled_date, visit_type, priority, status, created_by,
                notes, completed_at, created_at
         FROM follow_up_schedule
         WHERE patient_id = ?1 AND status = 'PENDING'
         ORDER BY scheduled_date ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![patient_id], row_to_followup)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn mark_followup_done(
    conn: &Connection,
    id: i64,
    now: &NaiveDateTime,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE follow_up_schedule SET status = 'DONE', completed_at = ?1
         WHERE id = ?2 AND status = 'PENDING'",
        params![format_ts(now), id],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "pending follow_up".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn row_to_followup(row: &rusqlite::Row) -> Result<FollowUp, rusqlite::Error> {
    let date: String = row.get(2)?;
    let priority: String = row.get(4)?;
    let status: String = row.get(5)?;
    let completed: Option<String> = row.get(8)?;
    let created: String = row.get(9)?;
    Ok(FollowUp {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        scheduled_date: parse_date(2, &date)?,
        visit_type: row.get(3)?,
        priority: parse_enum(4, &priority)?,
        status: parse_enum(5, &status)?,
        created_by: row.get(6)?,
        notes: row.get(7)?,
        completed_at: completed.map(|s| parse_ts(8, &s)).transpose()?,
        created_at: parse_ts(9, &created)?,
    })
}
