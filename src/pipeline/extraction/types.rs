use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{OcrError, ParseError};
use crate::models::DocumentType;

/// What to process: a file on disk, or text the user typed in (the manual
/// entry path after an OCR failure).
#[derive(Debug, Clone)]
pub enum DocumentSource {
    File(PathBuf),
    Text {
        content: String,
        title: Option<String>,
    },
}

impl DocumentSource {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            title: None,
        }
    }

    /// Short label for logs. Never includes document content.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Text { .. } => "text",
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// Raw OCR result from the engine
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub confidence: f32,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<OcrOutput, OcrError>;
}

/// PDF text extraction abstraction. One string per page, in page order.
pub trait PdfExtractor: Send + Sync {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ParseError>;
}

/// Result of genre classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub document_type: DocumentType,
    pub confidence: f32,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
        }
    }
}
