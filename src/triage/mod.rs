//! Triage: red-flag detection and risk classification.

pub mod classifier;
pub mod red_flags;
pub mod types;

pub use classifier::{apply_floors, classify_vitals, fallback_assessment, RiskClassifier};
pub use red_flags::{detect_red_flags, RED_FLAG_KEYWORDS};
pub use types::*;
