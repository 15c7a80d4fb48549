use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::FollowupPolicy;
use crate::models::{CareDecision, WorkflowState, WorkflowStatus};

pub const ACTION_CLOSED_STABLE: &str = "Case closed - symptoms stable";
pub const ACTION_ESCALATE_MISSED: &str = "Escalate case - follow-up missed";
pub const ACTION_REMINDER: &str = "Reminder: ASHA follow-up visit due";
pub const ACTION_MONITOR: &str = "Monitor symptoms at home";
pub const ACTION_AWAIT_VISIT: &str = "ASHA follow-up visit scheduled";
pub const ACTION_URGENT_REVIEW: &str = "Urgent review - emergency referral";
pub const ACTION_AMBULANCE: &str = "Immediate Ambulance Dispatch";

/// Outcome of evaluating one workflow at `now`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: WorkflowState,
    pub next_action: String,
    pub status: WorkflowStatus,
    /// State or action differs from the input.
    pub changed: bool,
}

/// Advance a workflow by elapsed time since creation. Pure; only moves
/// forward and never touches closed, escalated or emergency episodes.
pub fn advance(
    state: WorkflowState,
    next_action: &str,
    created_at: &NaiveDateTime,
    now: &NaiveDateTime,
    policy: &FollowupPolicy,
) -> Transition {
    let elapsed_hours = (*now - *created_at).num_seconds() as f64 / 3600.0;

    let (new_state, action) = match state {
        WorkflowState::Monitoring if elapsed_hours >= policy.monitoring_close_hours as f64 => {
            (WorkflowState::Closed, ACTION_CLOSED_STABLE)
        }
        WorkflowState::AwaitingFollowup if elapsed_hours >= policy.escalate_hours as f64 => {
            (WorkflowState::Escalated, ACTION_ESCALATE_MISSED)
        }
        WorkflowState::AwaitingFollowup if elapsed_hours >= policy.reminder_hours as f64 => {
            (WorkflowState::AwaitingFollowup, ACTION_REMINDER)
        }
        _ => (state, next_action),
    };

    let status = match new_state {
        WorkflowState::Closed => WorkflowStatus::Closed,
        WorkflowState::Emergency => WorkflowStatus::Locked,
        _ => WorkflowStatus::Active,
    };

    Transition {
        state: new_state,
        next_action: action.to_string(),
        status,
        changed: new_state != state || action != next_action,
    }
}

/// Opening state and action for a new episode after triage.
pub fn initial_state(decision: CareDecision) -> (WorkflowState, &'static str) {
    match decision {
        CareDecision::HomeCare => (WorkflowState::Monitoring, ACTION_MONITOR),
        CareDecision::Emergency => (WorkflowState::Escalated, ACTION_URGENT_REVIEW),
        CareDecision::AshaFollowUp | CareDecision::DoctorConsultation => {
            (WorkflowState::AwaitingFollowup, ACTION_AWAIT_VISIT)
        }
    }
}
