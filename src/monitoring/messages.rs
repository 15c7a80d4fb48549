use crate::models::{TrendDirection, VitalKind};

/// Human-readable text for alerts and advisories.
pub struct MessageTemplates;

impl MessageTemplates {
    /// Trend alert, e.g. "Blood pressure rising trend detected (35 points in 3 days)".
    pub fn vital_trend(
        kind: VitalKind,
        direction: TrendDirection,
        magnitude: f64,
        span_days: i64,
    ) -> String {
        let direction = direction.as_str().to_lowercase();
        let days = plural_days(span_days);
        match kind {
            VitalKind::BloodPressure => format!(
                "Blood pressure {direction} trend detected ({magnitude} points in {days})"
            ),
            VitalKind::BloodSugar => format!(
                "Blood sugar {direction} trend detected ({magnitude} mg/dL in {days})"
            ),
        }
    }

    pub fn triage_risk(primary_diagnosis: &str) -> String {
        format!("High risk triage: {primary_diagnosis}")
    }

    pub fn sos() -> String {
        "SOS triggered: emergency assistance requested".to_string()
    }

    pub fn outbreak_title(village: &str) -> String {
        format!("Outbreak Alert: {village}")
    }

    /// Advisory body sent to the ministry.
    pub fn outbreak_advisory(village: &str, case_count: i64) -> String {
        format!(
            "DETECTED OUTBREAK: {case_count} recent triage reports in {village}. \
             Immediate survey required."
        )
    }

    /// Notice returned to the submitting health worker.
    pub fn outbreak_notice(village: &str) -> String {
        format!("Potential outbreak detected in {village}. Ministry notified automatically.")
    }
}

fn plural_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bp_trend_message() {
        assert_eq!(
            MessageTemplates::vital_trend(VitalKind::BloodPressure, TrendDirection::Rising, 35.0, 3),
            "Blood pressure rising trend detected (35 points in 3 days)"
        );
    }

    #[test]
    fn sugar_trend_message() {
        assert_eq!(
            MessageTemplates::vital_trend(VitalKind::BloodSugar, TrendDirection::Falling, 62.5, 1),
            "Blood sugar falling trend detected (62.5 mg/dL in 1 day)"
        );
    }

    #[test]
    fn outbreak_messages_name_village() {
        let advisory = MessageTemplates::outbreak_advisory("Udane", 3);
        assert!(advisory.starts_with("DETECTED OUTBREAK: 3 recent triage reports in Udane."));
        assert!(MessageTemplates::outbreak_notice("Udane").contains("Udane"));
    }
}
