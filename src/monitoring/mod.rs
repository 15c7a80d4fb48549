//! Longitudinal monitoring: vital trends, patient alerts and village
//! outbreak advisories.

pub mod alerts;
pub mod messages;
pub mod outbreak;
pub mod trend;

pub use alerts::AlertManager;
pub use messages::MessageTemplates;
pub use outbreak::{OutbreakAlert, OutbreakDetector};
pub use trend::{detect_trend, scan_trend, TrendResult};
