use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::{TrendBand, TrendConfig};
use crate::db::{get_readings_since, DatabaseError};
use crate::models::{Reading, Severity, TrendDirection, VitalKind};

/// Direction and severity of one vital channel over the lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub kind: VitalKind,
    pub direction: TrendDirection,
    pub severity: Severity,
    /// last − first on the primary channel.
    pub change: f64,
    pub magnitude: f64,
    pub first_value: Option<String>,
    pub last_value: Option<String>,
    pub readings_count: usize,
    /// Whole days between first and last reading, at least 1.
    pub span_days: i64,
}

impl TrendResult {
    fn insufficient(kind: VitalKind, readings_count: usize) -> Self {
        Self {
            kind,
            direction: TrendDirection::InsufficientData,
            severity: Severity::None,
            change: 0.0,
            magnitude: 0.0,
            first_value: None,
            last_value: None,
            readings_count,
            span_days: 0,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.severity != Severity::None
    }
}

/// Classify readings ordered oldest to newest. Pure.
pub fn detect_trend(kind: VitalKind, readings: &[Reading], config: &TrendConfig) -> TrendResult {
    let (first, last) = match (readings.first(), readings.last()) {
        (Some(first), Some(last)) if readings.len() >= 2 => (first, last),
        _ => return TrendResult::insufficient(kind, readings.len()),
    };

    let band = match kind {
        VitalKind::BloodPressure => &config.blood_pressure,
        VitalKind::BloodSugar => &config.sugar,
    };
    let change = last.value1 - first.value1;
    let (direction, severity) = classify_change(change, band);

    TrendResult {
        kind,
        direction,
        severity,
        change,
        magnitude: change.abs(),
        first_value: Some(first.formatted()),
        last_value: Some(last.formatted()),
        readings_count: readings.len(),
        span_days: (last.recorded_at - first.recorded_at).num_days().max(1),
    }
}

fn classify_change(change: f64, band: &TrendBand) -> (TrendDirection, Severity) {
    if change >= band.rise_high {
        (TrendDirection::Rising, Severity::High)
    } else if change >= band.rise_moderate {
        (TrendDirection::Rising, Severity::Moderate)
    } else if change <= -band.fall_moderate {
        (TrendDirection::Falling, Severity::Moderate)
    } else {
        (TrendDirection::Stable, Severity::None)
    }
}

/// Fetch the lookback window for one patient and vital, then classify.
pub fn scan_trend(
    conn: &Connection,
    patient_id: i64,
    kind: VitalKind,
    config: &TrendConfig,
    now: &NaiveDateTime,
) -> Result<TrendResult, DatabaseError> {
    let since = *now - Duration::days(config.lookback_days);
    let readings = get_readings_since(conn, patient_id, kind, &since)?;
    Ok(detect_trend(kind, &readings, config))
}
