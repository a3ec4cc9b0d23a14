use std::sync::Arc;

use crate::models::{DocumentType, StructuredData};
use crate::pipeline::doc_spec::DocumentSpec;
use crate::pipeline::generation::{
    generate_with_retry, sanitize_for_llm, GenerationError, GenerationRequest, LlmClient,
    SamplingParams,
};

use super::confidence::{cap_to_source_confidence, extraction_confidence};
use super::parser::parse_extraction_response;
use super::prompt::{build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use super::validation::validate_structured_data;

/// Result of one extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub data: StructuredData,
    /// Mean item confidence; 0 when extraction failed or found nothing.
    pub confidence: f32,
    pub degraded: bool,
}

impl ExtractionOutcome {
    pub fn empty() -> Self {
        Self {
            data: StructuredData::default(),
            confidence: 0.0,
            degraded: true,
        }
    }
}

/// Pulls typed fields out of document text. Never fails: backend or parse
/// errors yield empty data.
#[derive(Clone)]
pub struct StructuredExtractor {
    client: Arc<dyn LlmClient>,
}

impl StructuredExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn extract(&self, text: &str, document_type: DocumentType) -> StructuredData {
        self.extract_scored(text, document_type, None, "").data
    }

    /// Extract and score. `source_confidence` is the OCR confidence of the
    /// text, when it came from OCR. Blocking.
    pub fn extract_scored(
        &self,
        text: &str,
        document_type: DocumentType,
        source_confidence: Option<f32>,
        correlation_id: &str,
    ) -> ExtractionOutcome {
        let spec = DocumentSpec::for_type(document_type);
        let data = match self.try_extract(text, spec, correlation_id) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    correlation_id,
                    document_type = %document_type,
                    backend = self.client.name(),
                    error = %e,
                    "Extraction failed, returning empty data"
                );
                return ExtractionOutcome::empty();
            }
        };

        let mut data = validate_structured_data(data, correlation_id).data;
        if let Some(source) = source_confidence {
            cap_to_source_confidence(&mut data, source);
        }
        let confidence = extraction_confidence(&data);

        tracing::info!(
            correlation_id,
            document_type = %document_type,
            items = data.item_count(),
            confidence,
            "Structured data extracted"
        );

        ExtractionOutcome {
            data,
            confidence,
            degraded: false,
        }
    }

    fn try_extract(
        &self,
        text: &str,
        spec: &DocumentSpec,
        correlation_id: &str,
    ) -> Result<StructuredData, GenerationError> {
        let sanitized = sanitize_for_llm(text, correlation_id);
        if sanitized.trim().is_empty() {
            return Err(GenerationError::MalformedResponse(
                "Nothing left to extract after sanitization".into(),
            ));
        }

        let request = GenerationRequest {
            system: EXTRACTION_SYSTEM_PROMPT.to_string(),
            prompt: build_extraction_prompt(&sanitized, spec),
            params: SamplingParams::EXTRACTION,
        };
        let response = generate_with_retry(self.client.as_ref(), &request)?;
        parse_extraction_response(&response, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestStatus;
    use crate::pipeline::generation::MockLlmClient;

    const LAB_TEXT: &str = "LIPID PANEL\nLDL Cholesterol 110 mg/dL (ref <100)";

    const LAB_RESPONSE: &str = r#"{
        "dates": [{"date": "01/15/2025", "type": "test", "description": "Blood draw", "confidence": 0.9}],
        "testResults": [{"name": "LDL Cholesterol", "value": "110", "unit": "mg/dL", "normalRange": "<100", "confidence": 0.7}]
    }"#;

    fn extractor(client: MockLlmClient) -> (StructuredExtractor, Arc<MockLlmClient>) {
        let client = Arc::new(client);
        (StructuredExtractor::new(client.clone()), client)
    }

    #[test]
    fn extracts_validates_and_scores() {
        let (e, client) = extractor(MockLlmClient::new(LAB_RESPONSE));
        let outcome = e.extract_scored(LAB_TEXT, DocumentType::LabReport, None, "doc_1");
        assert!(!outcome.degraded);
        assert_eq!(outcome.data.dates[0].date, "2025-01-15");
        assert_eq!(outcome.data.test_results[0].status, TestStatus::Abnormal);
        assert!((outcome.confidence - 0.8).abs() < 1e-6);
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn ocr_confidence_caps_items() {
        let (e, _) = extractor(MockLlmClient::new(LAB_RESPONSE));
        let outcome = e.extract_scored(LAB_TEXT, DocumentType::LabReport, Some(0.5), "doc_2");
        assert!(outcome.data.confidences().all(|c| c <= 0.55 + 1e-6));
    }

    #[test]
    fn failure_yields_empty_data() {
        let (e, client) = extractor(MockLlmClient::failing(GenerationError::Backend {
            status: 500,
            body: "oops".into(),
        }));
        let outcome = e.extract_scored(LAB_TEXT, DocumentType::LabReport, None, "doc_3");
        assert!(outcome.degraded);
        assert!(outcome.data.is_empty());
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn garbage_output_yields_empty_data() {
        let (e, _) = extractor(MockLlmClient::new("Sorry, I can't do that."));
        assert!(e.extract(LAB_TEXT, DocumentType::LabReport).is_empty());
    }

    #[test]
    fn empty_lists_are_a_valid_result() {
        let (e, _) = extractor(MockLlmClient::new(r#"{"dates": [], "providers": []}"#));
        let outcome = e.extract_scored(LAB_TEXT, DocumentType::Radiology, None, "doc_4");
        assert!(!outcome.degraded);
        assert!(outcome.data.is_empty());
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn uses_deterministic_sampling() {
        assert_eq!(SamplingParams::EXTRACTION.temperature, 0.0);
        assert_eq!(SamplingParams::EXTRACTION.max_tokens, 800);
    }
}
