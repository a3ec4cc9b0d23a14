use serde::{Deserialize, Serialize};

use crate::config::{MAX_FILE_SIZE, SUPPORTED_EXTENSIONS};
use crate::models::DocumentType;

/// Static description of what the pipeline accepts and produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub supported_formats: Vec<String>,
    pub max_file_size: u64,
    pub supported_document_types: Vec<DocumentType>,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub summarization: bool,
    pub structured_extraction: bool,
    pub confidence_scoring: bool,
    pub safety_validation: bool,
    pub citation_tracking: bool,
    pub multi_language: bool,
}

pub fn capabilities() -> Capabilities {
    Capabilities {
        supported_formats: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        max_file_size: MAX_FILE_SIZE,
        supported_document_types: DocumentType::known().collect(),
        features: FeatureFlags {
            summarization: true,
            structured_extraction: true,
            confidence_scoring: true,
            safety_validation: true,
            citation_tracking: true,
            // Prompts and safety rules are English-only.
            multi_language: false,
        },
    }
}
