pub mod advisory;
pub mod alert;
pub mod enums;
pub mod followup;
pub mod patient;
pub mod reading;
pub mod triage;
pub mod workflow;

pub use advisory::*;
pub use alert::*;
pub use enums::*;
pub use followup::*;
pub use patient::*;
pub use reading::*;
pub use triage::*;
pub use workflow::*;
