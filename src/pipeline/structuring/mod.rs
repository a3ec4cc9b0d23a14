//! StructuredExtractor: typed fields (dates, medications, test results,
//! diagnoses, providers, appointments) pulled out of document text.

pub mod confidence;
pub mod extractor;
pub mod parser;
pub mod prompt;
pub mod validation;

pub use confidence::*;
pub use extractor::*;
pub use parser::*;
pub use prompt::*;
pub use validation::*;
