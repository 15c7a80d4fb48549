//! Application paths and the tunable engine configuration.
//!
//! Every threshold the decision core uses lives in [`EngineConfig`] so a
//! deployment can retune cut-offs, weights and windows by dropping an
//! `engine.json` next to the database. Missing keys fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "HealthGuard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "HEALTHGUARD_DATA_DIR";

/// Get the application data directory.
/// `$HEALTHGUARD_DATA_DIR` when set, otherwise ~/HealthGuard/.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the clinical SQLite database.
pub fn database_path() -> PathBuf {
    app_data_dir().join("health.db")
}

/// Path of the optional engine configuration file.
pub fn engine_config_path() -> PathBuf {
    app_data_dir().join("engine.json")
}

/// Path of the optional home-remedy reference override.
pub fn remedies_path() -> PathBuf {
    app_data_dir().join("home_remedies.json")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "healthguard_lib=info,healthguard=info,warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {0}: {1}")]
    Read(String, String),

    #[error("Invalid config file {0}: {1}")]
    Parse(String, String),
}

// ═══════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════

/// Latest-reading cut-offs that make `vitals_risk = HIGH`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VitalThresholds {
    pub critical_systolic: f64,
    pub critical_sugar: f64,
}

impl Default for VitalThresholds {
    fn default() -> Self {
        Self {
            critical_systolic: 160.0,
            critical_sugar: 250.0,
        }
    }
}

/// Change thresholds for one vital channel, compared against last − first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendBand {
    pub rise_high: f64,
    pub rise_moderate: f64,
    pub fall_moderate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendConfig {
    pub lookback_days: i64,
    pub blood_pressure: TrendBand,
    pub sugar: TrendBand,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            blood_pressure: TrendBand {
                rise_high: 30.0,
                rise_moderate: 20.0,
                fall_moderate: 20.0,
            },
            sugar: TrendBand {
                rise_high: 80.0,
                rise_moderate: 50.0,
                fall_moderate: 50.0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertPolicy {
    /// An unacknowledged alert for the same (patient, vital) inside this
    /// window suppresses a new one.
    pub dedup_window_hours: i64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            dedup_window_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutbreakPolicy {
    pub window_days: i64,
    /// Cases (recent reports + the one in flight) needed to raise an advisory.
    pub case_threshold: i64,
    pub advisory_cooldown_hours: i64,
}

impl Default for OutbreakPolicy {
    fn default() -> Self {
        Self {
            window_days: 7,
            case_threshold: 3,
            advisory_cooldown_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UrgencyWeights {
    pub high_alert: u32,
    pub moderate_alert: u32,
    pub overdue_base: u32,
    pub overdue_per_day: u32,
    pub overdue_cap: u32,
    pub critical_vitals: u32,
    pub pending_triage: u32,
    pub max_score: u32,
    pub high_level: u32,
    pub moderate_level: u32,
}

impl Default for UrgencyWeights {
    fn default() -> Self {
        Self {
            high_alert: 50,
            moderate_alert: 30,
            overdue_base: 20,
            overdue_per_day: 5,
            overdue_cap: 40,
            critical_vitals: 15,
            pending_triage: 10,
            max_score: 100,
            high_level: 50,
            moderate_level: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FollowupPolicy {
    pub monitoring_close_hours: i64,
    pub escalate_hours: i64,
    pub reminder_hours: i64,
    /// Follow-up horizons in days, by final risk.
    pub horizon_critical_days: i64,
    pub horizon_high_days: i64,
    pub horizon_moderate_days: i64,
    pub horizon_low_days: i64,
}

impl Default for FollowupPolicy {
    fn default() -> Self {
        Self {
            monitoring_close_hours: 72,
            escalate_hours: 48,
            reminder_hours: 24,
            horizon_critical_days: 0,
            horizon_high_days: 1,
            horizon_moderate_days: 2,
            horizon_low_days: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RosterConfig {
    /// Only this many top-urgency patients get a trend re-scan per run.
    pub trend_scan_top_n: usize,
    pub minutes_per_visit: u32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            trend_scan_top_n: 5,
            minutes_per_visit: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    /// OpenAI-compatible chat-completions base URL.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Name of the environment variable holding the bearer key.
    pub api_key_env: String,
    pub differential_top_n: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".into(),
            model: "google/gemini-2.0-flash-001".into(),
            timeout_secs: 30,
            temperature: 0.1,
            api_key_env: "OPENROUTER_API_KEY".into(),
            differential_top_n: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub vital_scan_interval_secs: u64,
    pub roster_interval_secs: u64,
    pub outbreak_sweep_interval_secs: u64,
    pub workflow_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            vital_scan_interval_secs: 24 * 3600,
            roster_interval_secs: 24 * 3600,
            outbreak_sweep_interval_secs: 6 * 3600,
            workflow_interval_secs: 3600,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// EngineConfig
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub vitals: VitalThresholds,
    pub trend: TrendConfig,
    pub alerts: AlertPolicy,
    pub outbreak: OutbreakPolicy,
    pub urgency: UrgencyWeights,
    pub followup: FollowupPolicy,
    pub roster: RosterConfig,
    pub inference: InferenceConfig,
    pub scheduler: SchedulerConfig,
    /// District used for advisories when the patient record has none.
    pub default_district: String,
    /// Locale for the home-remedy reference text ("en" or "hi").
    pub locale: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vitals: VitalThresholds::default(),
            trend: TrendConfig::default(),
            alerts: AlertPolicy::default(),
            outbreak: OutbreakPolicy::default(),
            urgency: UrgencyWeights::default(),
            followup: FollowupPolicy::default(),
            roster: RosterConfig::default(),
            inference: InferenceConfig::default(),
            scheduler: SchedulerConfig::default(),
            default_district: "Dhule".into(),
            locale: "en".into(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&json)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::info!(path = %path.display(), "Loading engine config");
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No engine config file, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_healthguard() {
        assert_eq!(APP_NAME, "HealthGuard");
    }

    #[test]
    fn database_under_data_dir() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("health.db"));
    }

    #[test]
    fn defaults_match_clinical_cutoffs() {
        let config = EngineConfig::default();
        assert_eq!(config.vitals.critical_systolic, 160.0);
        assert_eq!(config.vitals.critical_sugar, 250.0);
        assert_eq!(config.trend.lookback_days, 7);
        assert_eq!(config.trend.blood_pressure.rise_high, 30.0);
        assert_eq!(config.trend.sugar.rise_moderate, 50.0);
        assert_eq!(config.outbreak.case_threshold, 3);
        assert_eq!(config.urgency.max_score, 100);
        assert_eq!(config.followup.monitoring_close_hours, 72);
        assert_eq!(config.roster.trend_scan_top_n, 5);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(
            &path,
            r#"{"vitals": {"critical_systolic": 150}, "default_district": "Nashik"}"#,
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.vitals.critical_systolic, 150.0);
        assert_eq!(config.vitals.critical_sugar, 250.0);
        assert_eq!(config.default_district, "Nashik");
        assert_eq!(config.outbreak, OutbreakPolicy::default());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Parse(_, _))
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let json = serde_json::to_string(&EngineConfig::default()).unwrap();
        assert!(json.contains("\"critical_sugar\":250.0"));
        assert!(json.contains("\"api_key_env\":\"OPENROUTER_API_KEY\""));
    }
}
