//! Text-generation backend contract shared by the summarizer and the
//! structured extractor: prompt plus sampling parameters in, raw text out.

pub mod mock;
pub mod ollama;
pub mod response;
pub mod sanitize;

pub use mock::*;
pub use ollama::*;
pub use response::*;
pub use sanitize::*;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generation backend is not reachable at {0}")]
    Connection(String),

    #[error("Generation backend returned error (status {status}): {body}")]
    Backend { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Generation task failed: {0}")]
    TaskFailed(String),
}

impl GenerationError {
    /// Transient failures worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::HttpClient(_) => true,
            Self::Backend { status, .. } => *status >= 500,
            Self::Timeout(_) | Self::MalformedResponse(_) | Self::TaskFailed(_) => false,
        }
    }
}

/// Sampling parameters passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl SamplingParams {
    /// Low-temperature prose for patient-facing summaries.
    pub const SUMMARY: SamplingParams = SamplingParams {
        temperature: 0.1,
        max_tokens: 500,
        top_p: 0.9,
    };

    /// Deterministic settings for field extraction.
    pub const EXTRACTION: SamplingParams = SamplingParams {
        temperature: 0.0,
        max_tokens: 800,
        top_p: 1.0,
    };
}

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub params: SamplingParams,
}

/// Generation backend abstraction (allows deterministic fakes in tests).
///
/// Calls are blocking; async callers go through `spawn_blocking`.
pub trait LlmClient: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Backend identifier for logs.
    fn name(&self) -> &str {
        "llm"
    }
}

/// Maximum attempts per generation call (first try plus one retry).
pub const MAX_GENERATION_ATTEMPTS: usize = 2;

/// Call the backend, retrying once on transient failures.
pub fn generate_with_retry(
    client: &dyn LlmClient,
    request: &GenerationRequest,
) -> Result<String, GenerationError> {
    let mut last_err = None;
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        match client.generate(request) {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() && attempt < MAX_GENERATION_ATTEMPTS => {
                tracing::warn!(
                    backend = client.name(),
                    attempt,
                    error = %e,
                    "Generation failed, retrying"
                );
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| GenerationError::TaskFailed("no attempt made".into())))
}
