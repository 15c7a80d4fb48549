use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::parser::parse_inference_response;
use super::prompt::build_triage_prompt;
use super::types::{DiagnosticInference, InferenceRequest, InferenceResponse};
use super::InferenceError;
use crate::config::InferenceConfig;
use crate::models::{CareDecision, RiskTier};

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionsClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        temperature: f32,
        timeout_secs: u64,
    ) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InferenceError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            temperature,
            client,
            timeout_secs,
        })
    }

    /// Build from config, reading the key from the configured env variable.
    pub fn from_config(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                env = %config.api_key_env,
                "No inference API key set; triage will use the deterministic fallback"
            );
        }
        Self::new(
            &config.base_url,
            &config.model,
            api_key,
            config.temperature,
            config.timeout_secs,
        )
    }

    fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| InferenceError::MissingApiKey(self.base_url.clone()))?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    InferenceError::Connection(self.base_url.clone())
                } else {
                    InferenceError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InferenceError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| InferenceError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| InferenceError::ResponseParsing("No choices in response".into()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl DiagnosticInference for ChatCompletionsClient {
    fn assess(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let prompt = build_triage_prompt(request);
        let content = self.complete(&prompt)?;
        parse_inference_response(&content)
    }
}

/// Mock reasoning service for testing: replies with configured raw text
/// (run through the real parser) or fails with a connection error.
pub struct MockInference {
    reply: Result<String, String>,
    calls: AtomicUsize,
    last_request: Mutex<Option<InferenceRequest>>,
}

impl MockInference {
    pub fn replying(raw: &str) -> Self {
        Self {
            reply: Ok(raw.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Well-formed reply with the given tier and decision.
    pub fn with_assessment(risk: RiskTier, decision: CareDecision) -> Self {
        let raw = serde_json::json!({
            "risk": risk.as_str(),
            "decision": decision.as_str(),
            "reasoning": "Mock assessment",
            "primary_diagnosis": "Viral fever",
            "asha_instructions": ["Check temperature daily"],
            "home_remedies": ["Drink plenty of fluids"],
            "red_flags_to_watch": ["High fever"],
        });
        Self::replying(&raw.to_string())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<InferenceRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

impl DiagnosticInference for MockInference {
    fn assess(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        match &self.reply {
            Ok(raw) => parse_inference_response(raw),
            Err(reason) => Err(InferenceError::Connection(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VitalsRisk;

    fn request() -> InferenceRequest {
        InferenceRequest {
            age: Some(30),
            chief_complaint: "fever".into(),
            symptoms: vec!["fever".into()],
            notes: String::new(),
            latest_bp: None,
            latest_sugar: None,
            vitals_risk: VitalsRisk::Normal,
            differential: vec![],
            red_flags: vec![],
            reference_text: String::new(),
        }
    }

    #[test]
    fn mock_returns_configured_assessment() {
        let mock = MockInference::with_assessment(RiskTier::Low, CareDecision::HomeCare);
        let result = mock.assess(&request()).unwrap();
        assert_eq!(result.risk, RiskTier::Low);
        assert_eq!(result.decision, CareDecision::HomeCare);
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.last_request().unwrap().chief_complaint, "fever");
    }

    #[test]
    fn mock_failure_is_connection_error() {
        let mock = MockInference::failing("offline");
        assert!(matches!(
            mock.assess(&request()),
            Err(InferenceError::Connection(_))
        ));
    }

    #[test]
    fn mock_garbage_reply_is_malformed() {
        let mock = MockInference::replying("sorry, no idea");
        assert!(matches!(
            mock.assess(&request()),
            Err(InferenceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client =
            ChatCompletionsClient::new("https://example.org/api/v1/", "m", None, 0.1, 30).unwrap();
        assert_eq!(client.base_url, "https://example.org/api/v1");
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn client_without_key_fails_before_network() {
        let client =
            ChatCompletionsClient::new("http://127.0.0.1:9", "m", Some("  ".into()), 0.1, 1)
                .unwrap();
        assert!(matches!(
            client.assess(&request()),
            Err(InferenceError::MissingApiKey(_))
        ));
    }

    #[test]
    fn unreachable_service_is_an_error_not_a_panic() {
        let client =
            ChatCompletionsClient::new("http://127.0.0.1:9", "m", Some("key".into()), 0.1, 2)
                .unwrap();
        assert!(client.assess(&request()).is_err());
    }
}
