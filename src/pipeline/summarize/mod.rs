//! MedicalSummarizer: patient-friendly summaries through the generation
//! backend. Any failure degrades to the fixed fail-safe summary.

pub mod parser;
pub mod prompt;
pub mod summarizer;

pub use parser::*;
pub use prompt::*;
pub use summarizer::*;
