use serde::Deserialize;

use super::types::InferenceResponse;
use super::InferenceError;
use crate::models::{CareDecision, RiskTier};

/// Parse free text from the reasoning service into a structured assessment.
///
/// The first well-formed JSON object in the text is used. A missing object,
/// or one without a recognisable risk tier and decision, is a failure.
pub fn parse_inference_response(text: &str) -> Result<InferenceResponse, InferenceError> {
    let json = extract_json_object(text)
        .ok_or_else(|| InferenceError::MalformedResponse("No JSON object found".into()))?;

    #[derive(Deserialize)]
    struct RawAssessment {
        risk: Option<String>,
        decision: Option<String>,
        reasoning: Option<String>,
        primary_diagnosis: Option<String>,
        asha_instructions: Option<Vec<serde_json::Value>>,
        home_remedies: Option<Vec<serde_json::Value>>,
        red_flags_to_watch: Option<Vec<serde_json::Value>>,
    }

    let raw: RawAssessment = serde_json::from_str(json)
        .map_err(|e| InferenceError::ResponseParsing(e.to_string()))?;

    let risk_str = raw
        .risk
        .ok_or_else(|| InferenceError::MalformedResponse("Missing risk".into()))?;
    let risk = RiskTier::parse_loose(&risk_str)
        .ok_or_else(|| InferenceError::MalformedResponse(format!("Unknown risk: {risk_str}")))?;

    let decision_str = raw
        .decision
        .ok_or_else(|| InferenceError::MalformedResponse("Missing decision".into()))?;
    let decision = CareDecision::parse_loose(&decision_str).ok_or_else(|| {
        InferenceError::MalformedResponse(format!("Unknown decision: {decision_str}"))
    })?;

    Ok(InferenceResponse {
        risk,
        decision,
        reasoning: raw.reasoning.unwrap_or_default(),
        primary_diagnosis: raw
            .primary_diagnosis
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        asha_instructions: parse_strings_lenient(raw.asha_instructions.as_deref()),
        home_remedies: parse_strings_lenient(raw.home_remedies.as_deref()),
        red_flags_to_watch: parse_strings_lenient(raw.red_flags_to_watch.as_deref()),
    })
}

/// Locate the first balanced `{...}` span that parses as a JSON object.
/// Braces inside string literals are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = matching_brace(bytes, start) {
            let candidate = &text[start..=end];
            if matches!(
                serde_json::from_str::<serde_json::Value>(candidate),
                Ok(serde_json::Value::Object(_))
            ) {
                return Some(candidate);
            }
        }
        search_from = start + 1;
    }
    None
}

fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Keep string items, skip anything else.
fn parse_strings_lenient(items: Option<&[serde_json::Value]>) -> Vec<String> {
    match items {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> String {
        r#"Here is my assessment:

```json
{
  "risk": "Moderate",
  "decision": "ASHA Follow-up",
  "reasoning": "Fever for two days with normal vitals.",
  "primary_diagnosis": "Viral fever",
  "asha_instructions": ["Check temperature twice daily", "Ensure ORS intake"],
  "home_remedies": ["Rest in a cool room", 42],
  "red_flags_to_watch": ["Fever above 103F"]
}
```
Let me know if you need more."#
            .to_string()
    }

    #[test]
    fn parses_fenced_assessment() {
        let parsed = parse_inference_response(&sample_response()).unwrap();
        assert_eq!(parsed.risk, RiskTier::Moderate);
        assert_eq!(parsed.decision, CareDecision::AshaFollowUp);
        assert_eq!(parsed.primary_diagnosis.as_deref(), Some("Viral fever"));
        assert_eq!(parsed.asha_instructions.len(), 2);
        assert_eq!(parsed.home_remedies, vec!["Rest in a cool room"]);
    }

    #[test]
    fn lenient_case_in_tier_and_decision() {
        let parsed =
            parse_inference_response(r#"{"risk": "HIGH", "decision": "doctor consultation"}"#)
                .unwrap();
        assert_eq!(parsed.risk, RiskTier::High);
        assert_eq!(parsed.decision, CareDecision::DoctorConsultation);
        assert!(parsed.asha_instructions.is_empty());
        assert!(parsed.primary_diagnosis.is_none());
    }

    #[test]
    fn no_json_is_malformed() {
        let result = parse_inference_response("I cannot assess this patient.");
        assert!(matches!(result, Err(InferenceError::MalformedResponse(_))));
    }

    #[test]
    fn unknown_risk_is_malformed() {
        let result = parse_inference_response(r#"{"risk": "Severe", "decision": "Emergency"}"#);
        assert!(matches!(result, Err(InferenceError::MalformedResponse(_))));
    }

    #[test]
    fn missing_decision_is_malformed() {
        let result = parse_inference_response(r#"{"risk": "Low"}"#);
        assert!(matches!(result, Err(InferenceError::MalformedResponse(_))));
    }

    #[test]
    fn extract_skips_broken_leading_braces() {
        let text = r#"Use {braces} carefully. {"risk": "Low", "note": "a } inside"} trailing {"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"risk": "Low", "note": "a } inside"}"#)
        );
    }

    #[test]
    fn extract_returns_first_of_two_objects() {
        let text = r#"{"a": 1} and {"b": 2}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn extract_handles_escaped_quotes() {
        let text = r#"{"reasoning": "patient said \"it hurts {here}\"", "risk": "Low"}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn unterminated_object_is_none() {
        assert!(extract_json_object(r#"{"risk": "Low""#).is_none());
    }
}
