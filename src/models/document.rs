use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceType;

/// Raw input after parsing: text plus everything the later stages need to
/// point back into the original document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub text: String,
    pub pages: usize,
    pub metadata: DocumentMetadata,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub file_size: u64,
    /// Detected format (`pdf`, `image`, `plain_text`).
    pub format: String,
    pub mime_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    /// Mean OCR confidence when the text came from an image.
    pub ocr_confidence: Option<f32>,
}

/// A pointer back into the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub text: String,
    pub page: Option<usize>,
    pub section: Option<String>,
    pub confidence: f32,
    pub source_type: SourceType,
}
