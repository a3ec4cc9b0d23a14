//! DocumentProcessor: turns a document reference into text, metadata and
//! citations, and classifies the document genre.

pub mod citation;
pub mod classify;
pub mod ocr;
pub mod pdf;
pub mod processor;
pub mod sanitize;
pub mod types;

pub use citation::*;
pub use classify::*;
pub use ocr::*;
pub use pdf::*;
pub use processor::*;
pub use sanitize::*;
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

/// Fatal parsing failure. The only error that escapes `process`.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("File too large: {size} bytes exceeds {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF is password-protected")]
    EncryptedPdf,

    #[error("PDF parsing failed: {0}")]
    Pdf(String),

    #[error("Text is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Document contains no readable text")]
    EmptyDocument,

    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
}

impl ParseError {
    /// OCR failures can be recovered by re-submitting the document as
    /// manually entered text. Everything else is final.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Ocr(_))
    }
}

/// Image-to-text failure. Recoverable by the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcrError {
    #[error("No OCR engine is configured")]
    EngineUnavailable,

    #[error("OCR produced no text")]
    EmptyResult,

    #[error("OCR engine failed: {0}")]
    Engine(String),
}
