use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::state_machine::{advance, ACTION_REMINDER};
use crate::config::FollowupPolicy;
use crate::db::{get_active_workflows, update_workflow, ClinicalStore, DatabaseError};
use crate::models::WorkflowState;

/// Outcome of one pass over active workflows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowScanSummary {
    pub scanned: u32,
    pub closed: u32,
    pub escalated: u32,
    pub reminded: u32,
    /// (workflow id, error) for episodes that could not be updated.
    pub failed: Vec<(i64, String)>,
}

/// Re-evaluate every active workflow and persist transitions in place.
///
/// Listing the workflows is fatal on failure; a failed update of a single
/// episode is logged and the scan continues.
pub fn run_workflow_scan(
    store: &ClinicalStore,
    policy: &FollowupPolicy,
    now: &NaiveDateTime,
) -> Result<WorkflowScanSummary, DatabaseError> {
    let workflows = {
        let conn = store.conn()?;
        get_active_workflows(&conn)?
    };

    let mut summary = WorkflowScanSummary::default();
    for wf in workflows {
        summary.scanned += 1;
        let transition = advance(wf.state, &wf.next_action, &wf.created_at, now, policy);
        if !transition.changed {
            continue;
        }

        let result = store.conn().and_then(|conn| {
            update_workflow(
                &conn,
                wf.id,
                transition.state,
                &transition.next_action,
                transition.status,
                now,
            )
        });

        match result {
            Ok(()) => {
                match transition.state {
                    WorkflowState::Closed => summary.closed += 1,
                    WorkflowState::Escalated => summary.escalated += 1,
                    _ if transition.next_action == ACTION_REMINDER => summary.reminded += 1,
                    _ => {}
                }
                tracing::info!(
                    workflow_id = wf.id,
                    patient_id = wf.patient_id,
                    from = wf.state.as_str(),
                    to = transition.state.as_str(),
                    "Workflow advanced"
                );
            }
            Err(e) => {
                tracing::warn!(workflow_id = wf.id, error = %e, "Workflow update failed, continuing");
                summary.failed.push((wf.id, e.to_string()));
            }
        }
    }

    tracing::info!(
        scanned = summary.scanned,
        closed = summary.closed,
        escalated = summary.escalated,
        reminded = summary.reminded,
        failed = summary.failed.len(),
        "Workflow scan complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{add_patient, ts};
    use crate::db::{get_latest_workflow, insert_workflow};
    use crate::models::WorkflowStatus;

    #[test]
    fn scan_applies_each_transition() {
        let store = ClinicalStore::open_in_memory().unwrap();
        let (a, b, c, d) = {
            let conn = store.conn().unwrap();
            let a = add_patient(&conn, "A", "Udane", "w1");
            let b = add_patient(&conn, "B", "Udane", "w1");
            let c = add_patient(&conn, "C", "Udane", "w1");
            let d = add_patient(&conn, "D", "Udane", "w1");
            insert_workflow(&conn, a, WorkflowState::Monitoring, "Monitor", WorkflowStatus::Active, &ts("2026-03-03 08:00:00")).unwrap();
            insert_workflow(&conn, b, WorkflowState::AwaitingFollowup, "Visit", WorkflowStatus::Active, &ts("2026-03-04 06:00:00")).unwrap();
            insert_workflow(&conn, c, WorkflowState::AwaitingFollowup, "Visit", WorkflowStatus::Active, &ts("2026-03-05 02:00:00")).unwrap();
            insert_workflow(&conn, d, WorkflowState::Emergency, "Ambulance", WorkflowStatus::Locked, &ts("2026-02-01 08:00:00")).unwrap();
            (a, b, c, d)
        };

        let now = ts("2026-03-06 09:00:00");
        let summary = run_workflow_scan(&store, &FollowupPolicy::default(), &now).unwrap();
        assert_eq!(summary.scanned, 3);
        assert_eq!((summary.closed, summary.escalated, summary.reminded), (1, 1, 1));
        assert!(summary.failed.is_empty());

        let conn = store.conn().unwrap();
        assert_eq!(get_latest_workflow(&conn, a).unwrap().unwrap().status, WorkflowStatus::Closed);
        assert_eq!(get_latest_workflow(&conn, b).unwrap().unwrap().state, WorkflowState::Escalated);
        assert_eq!(get_latest_workflow(&conn, c).unwrap().unwrap().next_action, ACTION_REMINDER);
        assert_eq!(get_latest_workflow(&conn, d).unwrap().unwrap().state, WorkflowState::Emergency);
    }

    #[test]
    fn second_scan_is_idempotent() {
        let store = ClinicalStore::open_in_memory().unwrap();
        {
            let conn = store.conn().unwrap();
            let a = add_patient(&conn, "A", "Udane", "w1");
            insert_workflow(&conn, a, WorkflowState::AwaitingFollowup, "Visit", WorkflowStatus::Active, &ts("2026-03-04 06:00:00")).unwrap();
        }
        let now = ts("2026-03-06 09:00:00");
        run_workflow_scan(&store, &FollowupPolicy::default(), &now).unwrap();
        let again = run_workflow_scan(&store, &FollowupPolicy::default(), &now).unwrap();
        assert_eq!(again.escalated, 0);
        assert_eq!(again.scanned, 1);
    }
}
