//! SafetyValidator: pure, synchronous two-phase gate.
//!
//! Phase A runs on parsed text before any generation; phase B runs on the
//! generated summary and structured data. Both are functions of their
//! inputs plus a read-only rule set shared across runs.

pub mod rules;
pub mod validator;

pub use rules::*;
pub use validator::*;

use std::path::PathBuf;

use thiserror::Error;

/// Rule-set load failures. Raised at construction time only; validation
/// itself never fails.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Regex compilation failed for '{pattern}': {message}")]
    RegexCompilation { pattern: String, message: String },

    #[error("Invalid safety rules JSON: {0}")]
    InvalidRules(String),

    #[error("Could not read safety rules from {path}: {source}")]
    RulesFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
