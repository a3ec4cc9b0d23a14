pub mod doc_spec;
pub mod extraction; // DocumentProcessor: parse, OCR, classify, citations
pub mod generation; // LlmClient contract + Ollama adapter
pub mod import; // format detection, file pre-checks, capabilities
pub mod orchestrator;
pub mod progress;
pub mod safety; // two-phase SafetyValidator
pub mod structuring; // StructuredExtractor
pub mod summarize; // MedicalSummarizer

pub use orchestrator::{overall_confidence, PipelineError, PipelineOrchestrator};
pub use progress::{new_correlation_id, ProgressCallback};
