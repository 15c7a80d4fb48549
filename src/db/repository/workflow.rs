use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{format_ts, parse_enum, parse_ts, DatabaseError};
use crate::models::{CareWorkflow, WorkflowState, WorkflowStatus};

const WORKFLOW_COLUMNS: &str =
    "id, patient_id, current_state, next_action, status, created_at, updated_at";

/// Open a new care episode.
pub fn insert_workflow(
    conn: &Connection,
    patient_id: i64,
    state: WorkflowState,
    next_action: &str,
    status: WorkflowStatus,
    now: &NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO care_workflows (patient_id, current_state, next_action, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            patient_id,
            state.as_str(),
            next_action,
            status.as_str(),
            format_ts(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_latest_workflow(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<CareWorkflow>, DatabaseError> {
    let sql = format!(
        "SELECT {WORKFLOW_COLUMNS} FROM care_workflows
         WHERE patient_id = ?1 ORDER BY created_at DESC, id DESC LIMIT 1"
    );
    conn.query_row(&sql, params![patient_id], row_to_workflow)
        .optional()
        .map_err(DatabaseError::from)
}

/// All episodes with status `active`, oldest first.
pub fn get_active_workflows(conn: &Connection) -> Result<Vec<CareWorkflow>, DatabaseError> {
    let sql = format!(
        "SELECT {WORKFLOW_COLUMNS} FROM care_workflows
         WHERE status = 'active' ORDER BY created_at ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_workflow)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// In-place transition of an open episode.
pub fn update_workflow(
    conn: &Connection,
    id: i64,
    state: WorkflowState,
    next_action: &str,
    status: WorkflowStatus,
    now: &NaiveDateTime,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE care_workflows
         SET current_state = ?1, next_action = ?2, status = ?3, updated_at = ?4
         WHERE id = ?5",
        params![state.as_str(), next_action, status.as_str(), format_ts(now), id],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "care_workflow".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Close a patient's still-active episodes when a new one supersedes them.
/// Locked emergency episodes are left alone.
pub fn close_active_workflows(
    conn: &Connection,
    patient_id: i64,
    now: &NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let affected = conn.execute(
        "UPDATE care_workflows SET status = 'closed', updated_at = ?1
         WHERE patient_id = ?2 AND status = 'active'",
        params![format_ts(now), patient_id],
    )?;
    Ok(affected)
}

/// Whether the patient has an active episode escalated for a missed follow-up.
pub fn has_escalated_workflow(conn: &Connection, patient_id: i64) -> Result<bool, DatabaseError> {
    let found: i64 = conn.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM care_workflows
             WHERE patient_id = ?1 AND status = 'active' AND current_state = ?2
         )",
        params![patient_id, WorkflowState::Escalated.as_str()],
        |row| row.get(0),
    )?;
    Ok(found != 0)
}

fn row_to_workflow(row: &rusqlite::Row) -> Result<CareWorkflow, rusqlite::Error> {
    let state: String = row.get(2)?;
    let status: String = row.get(4)?;
    let created: String = row.get(5)?;
    let updated: Option<String> = row.get(6)?;
    Ok(CareWorkflow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        state: parse_enum(2, &state)?,
        next_action: row.get(3)?,
        status: parse_enum(4, &status)?,
        created_at: parse_ts(5, &created)?,
        updated_at: updated.map(|s| parse_ts(6, &s)).transpose()?,
    })
}
