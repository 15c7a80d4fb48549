use super::types::InferenceRequest;
use crate::models::VitalsRisk;

/// Build the triage prompt sent to the reasoning service.
pub fn build_triage_prompt(request: &InferenceRequest) -> String {
    let age = request
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "Unknown".into());
    let notes = if request.notes.trim().is_empty() {
        "None"
    } else {
        request.notes.trim()
    };
    let red_flags = if request.red_flags.is_empty() {
        "None".to_string()
    } else {
        request.red_flags.join(", ")
    };

    format!(
        r#"You are a clinical triage AI for rural India. Your decisions must be safe but BALANCED. Do not be overly alarmist for common, mild symptoms.

Patient details:
Age: {age}
Chief complaint: {complaint}
Symptoms: {symptoms}
Notes: {notes}

CRITICAL VITALS:
- Latest BP: {bp}
- Latest Sugar: {sugar}
- Vitals Risk: {vitals_risk}

DIFFERENTIAL DIAGNOSIS (ML Model):
{differential}

RED FLAGS DETECTED: {red_flags}

AVAILABLE HOME REMEDIES (Reference):
{reference}

TASK:
1. Assess risk: Low / Moderate / High / Critical
   - LOW: Mild symptoms (cold, cough, mild headache) with NORMAL vitals and NO red flags.
   - MODERATE: Persistent symptoms, moderate pain, or slightly abnormal vitals.
   - HIGH: Red flags present, or Vitals are Critical (BP >= 160/100 or Sugar >= 250).
   - CRITICAL: Life-threatening (chest pain, unconsciousness, severe bleeding).

2. Decide next action: Home Care / ASHA Follow-up / Doctor Consultation / Emergency
3. Provide medical reasoning.
4. List ASHA instructions.
5. List Home Remedies (if Risk is LOW or MODERATE).

RULES:
- If RED FLAGS detected, risk must be at least High.
- If Vitals Risk is High, final risk must be at least High.
- For LOW risk, suggest "Home Care" or "ASHA Follow-up".
- Respond ONLY in valid JSON.

FORMAT:
{{
  "risk": "Low/Moderate/High/Critical",
  "decision": "Next Action",
  "reasoning": "Explanation",
  "primary_diagnosis": "Likely condition",
  "asha_instructions": ["Step 1", "Step 2"],
  "home_remedies": ["Remedy 1", "Remedy 2"],
  "red_flags_to_watch": ["Flag 1"]
}}
"#,
        complaint = request.chief_complaint,
        symptoms = request.symptoms.join(", "),
        bp = request.latest_bp.as_deref().unwrap_or("N/A"),
        sugar = request
            .latest_sugar
            .as_deref()
            .map(|s| format!("{s} mg/dL"))
            .unwrap_or_else(|| "N/A".into()),
        vitals_risk = vitals_risk_label(request),
        differential = format_differential(request),
        reference = request.reference_text.trim(),
    )
}

fn vitals_risk_label(request: &InferenceRequest) -> &'static str {
    match request.vitals_risk {
        VitalsRisk::High => "High",
        VitalsRisk::Normal => "Normal",
    }
}

/// "- Dengue (55.0%)" lines, or "Not available".
pub fn format_differential(request: &InferenceRequest) -> String {
    if request.differential.is_empty() {
        return "Not available".into();
    }
    request
        .differential
        .iter()
        .map(|d| format!("- {} ({:.1}%)", d.disease, d.confidence * 100.0))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::types::DifferentialCandidate;

    fn request() -> InferenceRequest {
        InferenceRequest {
            age: Some(52),
            chief_complaint: "Headache".into(),
            symptoms: vec!["headache".into(), "dizziness".into()],
            notes: String::new(),
            latest_bp: Some("165/100".into()),
            latest_sugar: None,
            vitals_risk: VitalsRisk::High,
            differential: vec![DifferentialCandidate {
                disease: "Hypertension".into(),
                confidence: 0.612,
            }],
            red_flags: vec![],
            reference_text: "**General health tips:**".into(),
        }
    }

    #[test]
    fn prompt_carries_patient_context() {
        let prompt = build_triage_prompt(&request());
        assert!(prompt.contains("Age: 52"));
        assert!(prompt.contains("Symptoms: headache, dizziness"));
        assert!(prompt.contains("- Latest BP: 165/100"));
        assert!(prompt.contains("- Latest Sugar: N/A"));
        assert!(prompt.contains("- Vitals Risk: High"));
        assert!(prompt.contains("RED FLAGS DETECTED: None"));
        assert!(prompt.contains("Notes: None"));
    }

    #[test]
    fn prompt_states_floors_and_format() {
        let prompt = build_triage_prompt(&request());
        assert!(prompt.contains("If RED FLAGS detected, risk must be at least High."));
        assert!(prompt.contains("\"red_flags_to_watch\": [\"Flag 1\"]"));
    }

    #[test]
    fn differential_formats_percentages() {
        assert_eq!(format_differential(&request()), "- Hypertension (61.2%)");
        let mut empty = request();
        empty.differential.clear();
        assert_eq!(format_differential(&empty), "Not available");
    }
}
