//! Risk classification.
//!
//! Combines red flags, the latest vitals and the reasoning service's answer
//! into a final tier and care decision. Two safety floors hold regardless of
//! what the service returns: any red flag, or a critical latest reading,
//! lifts the tier to at least High. When the service fails the result is
//! synthesised deterministically; this component never returns an adapter
//! error.

use crate::adapters::{
    DiagnosticInference, DifferentialCandidate, DifferentialDiagnosis, InferenceRequest,
    InferenceResponse, Locale, RemedyReference,
};
use crate::config::VitalThresholds;
use crate::db::{get_latest_reading, get_patient, ClinicalStore, DatabaseError};
use crate::models::{CareDecision, Reading, RiskTier, VitalKind, VitalsRisk};

use super::red_flags::detect_red_flags;
use super::types::{AssessmentSource, RiskAssessment, TriageInput, VitalsSnapshot};

const FALLBACK_INSTRUCTIONS: &[&str] = &[
    "Monitor patient closely",
    "Check vitals daily",
    "Report any worsening",
];

const FALLBACK_WATCH_LIST: &[&str] = &["Severe symptoms", "High fever", "Difficulty breathing"];

pub struct RiskClassifier<'a> {
    inference: &'a dyn DiagnosticInference,
    differential: &'a dyn DifferentialDiagnosis,
    remedies: &'a RemedyReference,
    thresholds: &'a VitalThresholds,
    differential_top_n: usize,
    locale: Locale,
}

impl<'a> RiskClassifier<'a> {
    pub fn new(
        inference: &'a dyn DiagnosticInference,
        differential: &'a dyn DifferentialDiagnosis,
        remedies: &'a RemedyReference,
        thresholds: &'a VitalThresholds,
    ) -> Self {
        Self {
            inference,
            differential,
            remedies,
            thresholds,
            differential_top_n: 3,
            locale: Locale::En,
        }
    }

    pub fn with_differential_top_n(mut self, top_n: usize) -> Self {
        self.differential_top_n = top_n;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Classify one submission. Only store failures are returned as errors.
    pub fn classify(
        &self,
        store: &ClinicalStore,
        input: &TriageInput,
    ) -> Result<RiskAssessment, DatabaseError> {
        // Store lock is released before either adapter is called.
        let (vitals, record_age) = {
            let conn = store.conn()?;
            let latest_bp = get_latest_reading(&conn, input.patient_id, VitalKind::BloodPressure)?;
            let latest_sugar = get_latest_reading(&conn, input.patient_id, VitalKind::BloodSugar)?;
            let age = get_patient(&conn, input.patient_id)?.and_then(|p| p.age);
            (
                classify_vitals(latest_bp, latest_sugar, self.thresholds),
                age,
            )
        };

        let red_flags = detect_red_flags(&input.symptoms, &input.notes);

        let symptom_text = format!("{} {}", input.chief_complaint, input.symptoms.join(" "));
        let differential = self
            .differential
            .rank(symptom_text.trim(), self.differential_top_n);

        let request = InferenceRequest {
            age: input.age.or(record_age),
            chief_complaint: input.chief_complaint.clone(),
            symptoms: input.symptoms.clone(),
            notes: input.notes.clone(),
            latest_bp: vitals.latest_bp.as_ref().map(Reading::formatted),
            latest_sugar: vitals.latest_sugar.as_ref().map(Reading::formatted),
            vitals_risk: vitals.risk,
            differential: differential.clone(),
            red_flags: red_flags.clone(),
            reference_text: self.remedies.reference_text(&input.symptoms, self.locale),
        };

        let assessment = match self.inference.assess(&request) {
            Ok(response) => {
                let assessment =
                    from_inference(response, differential, red_flags, vitals.risk);
                if assessment.floor_applied {
                    tracing::info!(
                        patient_id = input.patient_id,
                        risk = assessment.risk.as_str(),
                        "Safety floor raised inference risk"
                    );
                }
                assessment
            }
            Err(e) => {
                tracing::warn!(
                    patient_id = input.patient_id,
                    error = %e,
                    "Inference unavailable, using deterministic triage fallback"
                );
                fallback_assessment(differential, red_flags, vitals.risk)
            }
        };

        tracing::info!(
            patient_id = input.patient_id,
            risk = assessment.risk.as_str(),
            decision = assessment.decision.as_str(),
            source = ?assessment.source,
            red_flags = assessment.detected_red_flags.len(),
            "Triage classified"
        );
        Ok(assessment)
    }
}

/// HIGH when the latest systolic or sugar reading crosses its cut-off.
pub fn classify_vitals(
    latest_bp: Option<Reading>,
    latest_sugar: Option<Reading>,
    thresholds: &VitalThresholds,
) -> VitalsSnapshot {
    let bp_critical = latest_bp
        .as_ref()
        .is_some_and(|r| r.value1 >= thresholds.critical_systolic);
    let sugar_critical = latest_sugar
        .as_ref()
        .is_some_and(|r| r.value1 >= thresholds.critical_sugar);

    VitalsSnapshot {
        latest_bp,
        latest_sugar,
        risk: if bp_critical || sugar_critical {
            VitalsRisk::High
        } else {
            VitalsRisk::Normal
        },
    }
}

/// Raise `risk` to High when red flags or critical vitals require it.
/// Returns the floored tier and whether it changed.
pub fn apply_floors(
    risk: RiskTier,
    red_flags: &[String],
    vitals_risk: VitalsRisk,
) -> (RiskTier, bool) {
    if red_flags.is_empty() && vitals_risk != VitalsRisk::High {
        return (risk, false);
    }
    let floored = risk.at_least(RiskTier::High);
    (floored, floored != risk)
}

fn from_inference(
    response: InferenceResponse,
    differential: Vec<DifferentialCandidate>,
    red_flags: Vec<String>,
    vitals_risk: VitalsRisk,
) -> RiskAssessment {
    let (risk, floor_applied) = apply_floors(response.risk, &red_flags, vitals_risk);
    let primary_diagnosis = response
        .primary_diagnosis
        .or_else(|| differential.first().map(|d| d.disease.clone()))
        .unwrap_or_else(|| "Unknown".into());

    RiskAssessment {
        risk,
        decision: response.decision,
        reasoning: response.reasoning,
        primary_diagnosis,
        asha_instructions: response.asha_instructions,
        home_remedies: response.home_remedies,
        red_flags_to_watch: response.red_flags_to_watch,
        differential_diagnosis: differential,
        detected_red_flags: red_flags,
        vitals_risk,
        source: AssessmentSource::Inference,
        floor_applied,
    }
}

/// Deterministic assessment used when the reasoning service fails.
pub fn fallback_assessment(
    differential: Vec<DifferentialCandidate>,
    red_flags: Vec<String>,
    vitals_risk: VitalsRisk,
) -> RiskAssessment {
    let has_flags = !red_flags.is_empty();
    let critical_vitals = vitals_risk == VitalsRisk::High;

    let risk = if has_flags || critical_vitals {
        RiskTier::High
    } else {
        RiskTier::Moderate
    };
    let decision = if has_flags {
        CareDecision::Emergency
    } else {
        CareDecision::AshaFollowUp
    };

    let branch = match (has_flags, critical_vitals) {
        (true, true) => "red flags and critical vitals",
        (true, false) => "red flags",
        (false, true) => "critical vitals",
        (false, false) => "no red flags or critical vitals",
    };
    let flags_text = if has_flags {
        red_flags.join(", ")
    } else {
        "none".into()
    };
    let vitals_text = match vitals_risk {
        VitalsRisk::High => "High",
        VitalsRisk::Normal => "Normal",
    };

    RiskAssessment {
        risk,
        decision,
        reasoning: format!(
            "AI triage fallback ({branch}). Red flags: {flags_text}. Vitals: {vitals_text}."
        ),
        primary_diagnosis: differential
            .first()
            .map(|d| d.disease.clone())
            .unwrap_or_else(|| "Unknown".into()),
        asha_instructions: FALLBACK_INSTRUCTIONS.iter().map(|s| s.to_string()).collect(),
        home_remedies: Vec::new(),
        red_flags_to_watch: FALLBACK_WATCH_LIST.iter().map(|s| s.to_string()).collect(),
        differential_diagnosis: differential,
        detected_red_flags: red_flags,
        vitals_risk,
        source: AssessmentSource::Fallback,
        floor_applied: false,
    }
}
