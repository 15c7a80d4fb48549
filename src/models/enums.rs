use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(RiskTier {
    Low => "Low",
    Moderate => "Moderate",
    High => "High",
    Critical => "Critical",
});

impl RiskTier {
    fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Moderate => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }

    /// Raise to `floor` if below it. Never lowers.
    pub fn at_least(self, floor: RiskTier) -> RiskTier {
        if self.rank() < floor.rank() {
            floor
        } else {
            self
        }
    }

    /// Lenient parse for model output ("HIGH", " high ").
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" | "medium" => Some(Self::Moderate),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

str_enum!(CareDecision {
    HomeCare => "Home Care",
    AshaFollowUp => "ASHA Follow-up",
    DoctorConsultation => "Doctor Consultation",
    Emergency => "Emergency",
});

impl CareDecision {
    /// Lenient parse for model output; ignores case, spacing and hyphens.
    pub fn parse_loose(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "homecare" => Some(Self::HomeCare),
            "ashafollowup" | "followup" => Some(Self::AshaFollowUp),
            "doctorconsultation" | "doctor" => Some(Self::DoctorConsultation),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }
}

str_enum!(VitalsRisk {
    Normal => "NORMAL",
    High => "HIGH",
});

str_enum!(VitalKind {
    BloodPressure => "BP",
    BloodSugar => "SUGAR",
});

str_enum!(TrendDirection {
    Rising => "RISING",
    Falling => "FALLING",
    Stable => "STABLE",
    InsufficientData => "INSUFFICIENT_DATA",
});

str_enum!(Severity {
    High => "HIGH",
    Moderate => "MODERATE",
    None => "NONE",
});

str_enum!(AlertType {
    VitalTrendWorsening => "VITAL_TREND_WORSENING",
    VitalTrendImproving => "VITAL_TREND_IMPROVING",
    TriageRisk => "TRIAGE_RISK",
    SosTriggered => "SOS_TRIGGERED",
});

str_enum!(WorkflowState {
    Monitoring => "monitoring",
    AwaitingFollowup => "awaiting_followup",
    Escalated => "escalated",
    Closed => "closed",
    Emergency => "EMERGENCY",
});

str_enum!(WorkflowStatus {
    Active => "active",
    Closed => "closed",
    Locked => "locked",
});

str_enum!(FollowUpStatus {
    Pending => "PENDING",
    Done => "DONE",
});

str_enum!(TaskPriority {
    High => "HIGH",
    Medium => "MEDIUM",
    Low => "LOW",
});

str_enum!(PriorityLevel {
    High => "HIGH",
    Moderate => "MODERATE",
    Low => "LOW",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn risk_tier_round_trip() {
        for (variant, s) in [
            (RiskTier::Low, "Low"),
            (RiskTier::Moderate, "Moderate"),
            (RiskTier::High, "High"),
            (RiskTier::Critical, "Critical"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(RiskTier::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn care_decision_round_trip() {
        for (variant, s) in [
            (CareDecision::HomeCare, "Home Care"),
            (CareDecision::AshaFollowUp, "ASHA Follow-up"),
            (CareDecision::DoctorConsultation, "Doctor Consultation"),
            (CareDecision::Emergency, "Emergency"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(CareDecision::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn workflow_state_round_trip() {
        for (variant, s) in [
            (WorkflowState::Monitoring, "monitoring"),
            (WorkflowState::AwaitingFollowup, "awaiting_followup"),
            (WorkflowState::Escalated, "escalated"),
            (WorkflowState::Closed, "closed"),
            (WorkflowState::Emergency, "EMERGENCY"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(WorkflowState::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn at_least_only_raises() {
        assert_eq!(RiskTier::Low.at_least(RiskTier::High), RiskTier::High);
        assert_eq!(RiskTier::Moderate.at_least(RiskTier::High), RiskTier::High);
        assert_eq!(RiskTier::Critical.at_least(RiskTier::High), RiskTier::Critical);
        assert_eq!(RiskTier::High.at_least(RiskTier::High), RiskTier::High);
    }

    #[test]
    fn loose_parsing_accepts_model_variants() {
        assert_eq!(RiskTier::parse_loose(" HIGH "), Some(RiskTier::High));
        assert_eq!(RiskTier::parse_loose("severe"), None);
        assert_eq!(
            CareDecision::parse_loose("asha follow up"),
            Some(CareDecision::AshaFollowUp)
        );
        assert_eq!(
            CareDecision::parse_loose("EMERGENCY"),
            Some(CareDecision::Emergency)
        );
        assert_eq!(CareDecision::parse_loose("pharmacy"), None);
    }

    #[test]
    fn serde_uses_stored_names() {
        let json = serde_json::to_string(&CareDecision::AshaFollowUp).unwrap();
        assert_eq!(json, "\"ASHA Follow-up\"");
        let kind: VitalKind = serde_json::from_str("\"SUGAR\"").unwrap();
        assert_eq!(kind, VitalKind::BloodSugar);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(RiskTier::from_str("high").is_err());
        assert!(Severity::from_str("").is_err());
        assert!(VitalKind::from_str("TEMP").is_err());
    }
}
