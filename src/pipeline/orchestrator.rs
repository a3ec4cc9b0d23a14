//! PipelineOrchestrator: the single entry point. Runs
//! parsing → analyzing → summarizing/extracting → validating → complete | error
//! for one document and returns one immutable `ProcessingResult`.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tracing::Instrument;

use super::extraction::{Classification, DocumentProcessor, DocumentSource, ParseError};
use super::generation::{GenerationError, LlmClient, OllamaClient};
use super::import::{capabilities, validate_file, Capabilities, FileValidation};
use super::progress::{checkpoints, new_correlation_id, ProgressCallback, ProgressReporter};
use super::safety::{combine_checks, SafetyConfig, SafetyError, SafetyRules, SafetyValidator};
use super::structuring::{ExtractionOutcome, StructuredExtractor};
use super::summarize::{MedicalSummarizer, SummaryOutcome};
use crate::config::{ConfigError, PipelineConfig};
use crate::models::{
    ConfidenceScore, DocumentType, MedicalSummary, ParsedDocument, ProcessingOptions,
    ProcessingResult, ProcessingStage, RiskLevel, SafetyCheck, StructuredData,
};

/// Failures while assembling a pipeline. Runs themselves only fail with
/// `ParseError`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Safety rules error: {0}")]
    Safety(#[from] SafetyError),

    #[error("Generation backend error: {0}")]
    Generation(#[from] GenerationError),
}

pub struct PipelineOrchestrator {
    processor: Arc<DocumentProcessor>,
    validator: SafetyValidator,
    summarizer: MedicalSummarizer,
    extractor: StructuredExtractor,
}

impl PipelineOrchestrator {
    pub fn new(
        processor: DocumentProcessor,
        validator: SafetyValidator,
        summarizer: MedicalSummarizer,
        extractor: StructuredExtractor,
    ) -> Self {
        Self {
            processor: Arc::new(processor),
            validator,
            summarizer,
            extractor,
        }
    }

    /// Default processor and built-in safety rules; both generation stages
    /// share `client`.
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self::new(
            DocumentProcessor::default(),
            SafetyValidator::default(),
            MedicalSummarizer::new(Arc::clone(&client)),
            StructuredExtractor::new(client),
        )
    }

    /// Build from configuration: Ollama backend plus the optional rules file.
    ///
    /// The Ollama client is blocking; call this outside an async runtime.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let validator = match &config.safety_rules_path {
            Some(path) => SafetyValidator::new(&SafetyRules::from_path(path)?)?,
            None => SafetyValidator::default(),
        };
        let client: Arc<dyn LlmClient> = Arc::new(OllamaClient::from_config(config)?);

        tracing::info!(
            backend = client.name(),
            model = %config.model,
            custom_rules = config.safety_rules_path.is_some(),
            "Pipeline configured"
        );

        Ok(Self::new(
            DocumentProcessor::default(),
            validator,
            MedicalSummarizer::new(Arc::clone(&client)),
            StructuredExtractor::new(client),
        ))
    }

    /// Process one document.
    ///
    /// Only parse failures are returned as errors. Unsafe input, generation
    /// failures and timeouts all produce a well-formed result.
    pub async fn process(
        &self,
        source: DocumentSource,
        options: &ProcessingOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ProcessingResult, ParseError> {
        let progress = ProgressReporter::new(new_correlation_id(), on_progress);
        let span = tracing::info_span!(
            "process_document",
            correlation_id = %progress.correlation_id(),
            source = source.kind(),
        );
        self.run(source, options, progress).instrument(span).await
    }

    /// Parse and classify only.
    pub async fn classify_source(&self, source: DocumentSource) -> Result<Classification, ParseError> {
        let parsed = self.parse(source).await?;
        Ok(self.processor.classify(&parsed.text))
    }

    pub fn capabilities(&self) -> Capabilities {
        capabilities()
    }

    /// Cheap size/format pre-check to run before `process`.
    pub fn validate_file(&self, path: &Path) -> FileValidation {
        validate_file(path)
    }

    pub fn safety_config(&self) -> SafetyConfig {
        self.validator.config()
    }

    async fn run(
        &self,
        source: DocumentSource,
        options: &ProcessingOptions,
        progress: ProgressReporter,
    ) -> Result<ProcessingResult, ParseError> {
        let started = Instant::now();
        let correlation_id = progress.correlation_id().to_string();

        progress.report(ProcessingStage::Parsing, checkpoints::PARSING, "Parsing document...");
        let parsed = match self.parse(source).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, recoverable = e.is_recoverable(), "Document parsing failed");
                progress.report(ProcessingStage::Error, checkpoints::DONE, "Document could not be read");
                return Err(e);
            }
        };

        progress.report(
            ProcessingStage::Analyzing,
            checkpoints::ANALYZING,
            "Analyzing document type...",
        );
        let classification = self.processor.classify(&parsed.text);
        let pre_check = self.validator.pre_validate(&parsed.text);
        tracing::info!(
            document_type = %classification.document_type,
            classification_confidence = classification.confidence,
            pages = parsed.pages,
            risk = %pre_check.risk_level,
            "Document analyzed"
        );

        if pre_check.risk_level == RiskLevel::High {
            tracing::warn!(warnings = pre_check.warnings.len(), "Pre-generation safety check failed");
            progress.report(
                ProcessingStage::Error,
                checkpoints::DONE,
                "Document requires human review",
            );
            return Ok(failed_result(
                correlation_id,
                classification.document_type,
                parsed,
                pre_check,
                started,
            ));
        }

        let document_type = classification.document_type;
        let limit = options.stage_timeout();
        let text: Arc<str> = Arc::from(parsed.text.as_str());
        let source_confidence = parsed.metadata.ocr_confidence;

        let summarize = async {
            if !options.enable_summary {
                return None;
            }
            progress.report(
                ProcessingStage::Summarizing,
                checkpoints::SUMMARIZING,
                "Generating patient-friendly summary...",
            );
            let summarizer = self.summarizer.clone();
            let (text, id) = (Arc::clone(&text), correlation_id.clone());
            let outcome = run_blocking(limit, move || {
                summarizer.summarize_scored(&text, document_type, &id)
            })
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Summary stage failed, using fail-safe summary");
                SummaryOutcome::fail_safe()
            });
            Some(outcome)
        };

        let extract = async {
            if !options.enable_extraction {
                return None;
            }
            progress.report(
                ProcessingStage::Extracting,
                checkpoints::EXTRACTING,
                "Extracting key information...",
            );
            let extractor = self.extractor.clone();
            let (text, id) = (Arc::clone(&text), correlation_id.clone());
            let outcome = run_blocking(limit, move || {
                extractor.extract_scored(&text, document_type, source_confidence, &id)
            })
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Extraction stage failed, returning empty data");
                ExtractionOutcome::empty()
            });
            Some(outcome)
        };

        let (summary, extraction) = tokio::join!(summarize, extract);

        progress.report(
            ProcessingStage::Validating,
            checkpoints::VALIDATING,
            "Validating results...",
        );
        let summary_confidence = summary.as_ref().map(|s| s.confidence);
        let extraction_confidence = extraction.as_ref().map(|e| e.confidence);
        let overall = overall_confidence(summary_confidence, extraction_confidence);

        let post_check = self.validator.post_validate(
            summary.as_ref().map(|s| &s.summary),
            extraction.as_ref().map(|e| &e.data),
            overall,
            options.confidence_threshold,
        );
        let safety_check = combine_checks(&pre_check, post_check);

        let confidence = ConfidenceScore {
            overall,
            summary: summary_confidence.unwrap_or(0.0),
            extraction: extraction_confidence.unwrap_or(0.0),
            classification: classification.confidence,
            reasoning: confidence_reasoning(summary_confidence, extraction_confidence, &classification),
        };

        let result = ProcessingResult {
            id: correlation_id,
            document_type,
            summary: summary.map_or_else(MedicalSummary::not_requested, |s| s.summary),
            structured_data: extraction.map(|e| e.data).unwrap_or_default(),
            confidence,
            safety_check,
            citations: parsed.citations,
            processing_time: elapsed_ms(started),
            timestamp: Utc::now(),
        };

        tracing::info!(
            overall = result.confidence.overall,
            passed = result.safety_check.passed,
            risk = %result.safety_check.risk_level,
            human_review = result.safety_check.requires_human_review,
            processing_ms = result.processing_time,
            "Document processed"
        );
        progress.report(ProcessingStage::Complete, checkpoints::DONE, "Processing complete");

        Ok(result)
    }

    async fn parse(&self, source: DocumentSource) -> Result<ParsedDocument, ParseError> {
        let processor = Arc::clone(&self.processor);
        tokio::task::spawn_blocking(move || processor.parse(&source))
            .await
            .map_err(|e| ParseError::Io(std::io::Error::other(e.to_string())))?
    }
}

/// Run a blocking stage on the blocking pool, bounded by `limit`. A timed
/// out call is abandoned, not interrupted.
async fn run_blocking<T, F>(limit: Duration, work: F) -> Result<T, GenerationError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => Err(GenerationError::TaskFailed(join_error.to_string())),
        Err(_) => Err(GenerationError::Timeout(limit)),
    }
}

/// Mean of the generation stages that were enabled; a failed stage counts
/// as 0. Classification is reported separately.
pub fn overall_confidence(summary: Option<f32>, extraction: Option<f32>) -> f32 {
    let ran: Vec<f32> = [summary, extraction].into_iter().flatten().collect();
    if ran.is_empty() {
        0.0
    } else {
        ran.iter().sum::<f32>() / ran.len() as f32
    }
}

fn confidence_reasoning(
    summary: Option<f32>,
    extraction: Option<f32>,
    classification: &Classification,
) -> String {
    let stage = |name: &str, value: Option<f32>| match value {
        Some(v) => format!("{name} confidence {}%", percent(v)),
        None => format!("{name} skipped"),
    };
    format!(
        "{}; {}; classified as {} ({}%)",
        stage("summary", summary),
        stage("extraction", extraction),
        classification.document_type,
        percent(classification.confidence)
    )
}

fn percent(value: f32) -> i32 {
    (value * 100.0).round() as i32
}

/// A finished run never reports zero elapsed time.
fn elapsed_ms(started: Instant) -> u64 {
    (started.elapsed().as_millis() as u64).max(1)
}

/// Standard result for documents rejected before generation.
fn failed_result(
    id: String,
    document_type: DocumentType,
    parsed: ParsedDocument,
    safety_check: SafetyCheck,
    started: Instant,
) -> ProcessingResult {
    ProcessingResult {
        id,
        document_type,
        summary: MedicalSummary::fail_safe(),
        structured_data: StructuredData::default(),
        confidence: ConfidenceScore::zero("Safety check failed"),
        safety_check,
        citations: parsed.citations,
        processing_time: elapsed_ms(started),
        timestamp: Utc::now(),
    }
}
