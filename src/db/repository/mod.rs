//! Repository layer: entity-scoped database operations.
//!
//! Plain functions over a borrowed `Connection`. Callers obtain the
//! connection from [`crate::db::ClinicalStore::conn`] and decide how long to
//! hold it.

mod advisory;
mod alert;
mod followup;
mod patient;
mod reading;
mod triage;
mod workflow;

pub use advisory::*;
pub use alert::*;
pub use followup::*;
pub use patient::*;
pub use reading::*;
pub use triage::*;
pub use workflow::*;
