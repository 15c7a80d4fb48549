//! Follow-up obligations: the care-workflow state machine, the ASHA task
//! derived from a triage decision, and the periodic workflow scan.

pub mod runner;
pub mod state_machine;
pub mod task;

pub use runner::{run_workflow_scan, WorkflowScanSummary};
pub use state_machine::{advance, initial_state, Transition, ACTION_AMBULANCE};
pub use task::{asha_task, followup_horizon_days, AshaTask};
