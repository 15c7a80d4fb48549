//! Contracts to the two external services the triage classifier consults,
//! plus the reference text handed to the reasoning service.
//!
//! Neither adapter is trusted: every failure surfaces as an
//! [`InferenceError`] (or an empty differential) and the classifier degrades
//! to its deterministic fallback.

pub mod chat;
pub mod differential;
pub mod parser;
pub mod prompt;
pub mod remedies;
pub mod types;

pub use chat::{ChatCompletionsClient, MockInference};
pub use differential::{FixedDifferential, NoDifferential};
pub use parser::{extract_json_object, parse_inference_response};
pub use remedies::{Locale, RemedyReference};
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("No API key configured for {0}")]
    MissingApiKey(String),

    #[error("Inference service unreachable at {0}")]
    Connection(String),

    #[error("Inference request timed out after {0}s")]
    Timeout(u64),

    #[error("Inference service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Malformed assessment: {0}")]
    MalformedResponse(String),

    #[error("Cannot load reference data {0}: {1}")]
    ReferenceDataLoad(String, String),

    #[error("Invalid reference data {0}: {1}")]
    ReferenceDataParse(String, String),
}
