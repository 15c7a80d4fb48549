use serde::{Deserialize, Serialize};

use crate::config::FollowupPolicy;
use crate::models::{CareDecision, RiskTier, TaskPriority};

/// Instruction handed to the ASHA worker after triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AshaTask {
    pub task: String,
    pub priority: TaskPriority,
}

pub fn asha_task(decision: CareDecision) -> AshaTask {
    let (task, priority) = match decision {
        CareDecision::Emergency => (
            "Immediately escort patient to nearest government hospital \
             and coordinate ambulance services.",
            TaskPriority::High,
        ),
        CareDecision::AshaFollowUp => (
            "Visit patient within 24-48 hours, recheck vitals, and monitor symptoms.",
            TaskPriority::Medium,
        ),
        CareDecision::HomeCare => (
            "Educate patient on home care, ensure hydration, and follow up after 3 days.",
            TaskPriority::Low,
        ),
        CareDecision::DoctorConsultation => (
            "Follow up with patient as per standard protocol.",
            TaskPriority::Medium,
        ),
    };
    AshaTask {
        task: task.to_string(),
        priority,
    }
}

/// Days until the follow-up visit for a final risk tier and decision.
pub fn followup_horizon_days(
    risk: RiskTier,
    decision: CareDecision,
    policy: &FollowupPolicy,
) -> i64 {
    if risk == RiskTier::Critical || decision == CareDecision::Emergency {
        return policy.horizon_critical_days;
    }
    match risk {
        RiskTier::High => policy.horizon_high_days,
        RiskTier::Moderate => policy.horizon_moderate_days,
        RiskTier::Low | RiskTier::Critical => policy.horizon_low_days,
    }
}
