use std::sync::Arc;

use crate::models::{DocumentType, MedicalSummary};
use crate::pipeline::doc_spec::DocumentSpec;
use crate::pipeline::generation::{
    generate_with_retry, sanitize_for_llm, GenerationError, GenerationRequest, LlmClient,
    SamplingParams,
};

use super::parser::parse_summary_response;
use super::prompt::{build_summary_prompt, SUMMARY_SYSTEM_PROMPT};

/// Result of one summarization attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutcome {
    pub summary: MedicalSummary,
    /// Backend self-reported confidence; 0 for the fail-safe summary.
    pub confidence: f32,
    /// Set when the fail-safe summary was substituted.
    pub degraded: bool,
}

impl SummaryOutcome {
    pub fn fail_safe() -> Self {
        Self {
            summary: MedicalSummary::fail_safe(),
            confidence: 0.0,
            degraded: true,
        }
    }
}

/// Produces patient-friendly summaries. Never fails: every backend or
/// parse error yields the fail-safe summary.
#[derive(Clone)]
pub struct MedicalSummarizer {
    client: Arc<dyn LlmClient>,
}

impl MedicalSummarizer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Summarize `text` as a document of `document_type`.
    pub fn summarize(&self, text: &str, document_type: DocumentType) -> MedicalSummary {
        self.summarize_scored(text, document_type, "").summary
    }

    /// Summarize and report the backend confidence alongside the summary.
    /// Blocking; async callers run this on the blocking pool.
    pub fn summarize_scored(
        &self,
        text: &str,
        document_type: DocumentType,
        correlation_id: &str,
    ) -> SummaryOutcome {
        let spec = DocumentSpec::for_type(document_type);
        match self.try_summarize(text, spec, correlation_id) {
            Ok((summary, confidence)) => {
                tracing::info!(
                    correlation_id,
                    document_type = %document_type,
                    key_findings = summary.key_findings.len(),
                    abnormal_values = summary.abnormal_values.len(),
                    confidence,
                    "Summary generated"
                );
                SummaryOutcome {
                    summary,
                    confidence,
                    degraded: false,
                }
            }
            Err(e) => {
                tracing::warn!(
                    correlation_id,
                    document_type = %document_type,
                    backend = self.client.name(),
                    error = %e,
                    "Summarization failed, using fail-safe summary"
                );
                SummaryOutcome::fail_safe()
            }
        }
    }

    fn try_summarize(
        &self,
        text: &str,
        spec: &DocumentSpec,
        correlation_id: &str,
    ) -> Result<(MedicalSummary, f32), GenerationError> {
        let sanitized = sanitize_for_llm(text, correlation_id);
        if sanitized.trim().is_empty() {
            return Err(GenerationError::MalformedResponse(
                "Nothing left to summarize after sanitization".into(),
            ));
        }

        let request = GenerationRequest {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            prompt: build_summary_prompt(&sanitized, spec),
            params: SamplingParams::SUMMARY,
        };
        let response = generate_with_retry(self.client.as_ref(), &request)?;
        parse_summary_response(&response, spec)
    }
}
