use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Citation, DocumentType, MedicalSummary, ProcessingStage, RiskLevel, StructuredData};

/// Outcome of one safety validation phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyCheck {
    pub passed: bool,
    pub warnings: Vec<String>,
    pub requires_human_review: bool,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
}

impl SafetyCheck {
    /// True when any consumer must show a "consult your provider" state.
    pub fn requires_provider_consult(&self) -> bool {
        !self.passed || self.requires_human_review
    }
}

/// Self-reported certainty of one run. Every value is in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceScore {
    pub overall: f32,
    pub summary: f32,
    pub extraction: f32,
    pub classification: f32,
    pub reasoning: String,
}

impl ConfidenceScore {
    pub fn zero(reasoning: impl Into<String>) -> Self {
        Self {
            overall: 0.0,
            summary: 0.0,
            extraction: 0.0,
            classification: 0.0,
            reasoning: reasoning.into(),
        }
    }
}

/// Final artifact of a run. Built once, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub id: String,
    pub document_type: DocumentType,
    pub summary: MedicalSummary,
    pub structured_data: StructuredData,
    pub confidence: ConfidenceScore,
    pub safety_check: SafetyCheck,
    pub citations: Vec<Citation>,
    /// Wall-clock duration of the run in milliseconds.
    pub processing_time: u64,
    pub timestamp: DateTime<Utc>,
}

/// Progress event delivered to the per-run callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatus {
    pub correlation_id: String,
    pub stage: ProcessingStage,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining_ms: Option<u64>,
}

/// Per-run switches. Disabled stages are skipped, not emptied after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingOptions {
    pub enable_summary: bool,
    pub enable_extraction: bool,
    pub confidence_threshold: f32,
    /// Upper bound for each generation stage, in milliseconds.
    pub max_processing_time: u64,
    /// Reserved. Accepted and echoed, but every stage runs in English while
    /// multi-language support is off.
    pub language: String,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            enable_summary: true,
            enable_extraction: true,
            confidence_threshold: 0.5,
            max_processing_time: 30_000,
            language: "en".into(),
        }
    }
}

impl ProcessingOptions {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.max_processing_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_values() {
        let opts = ProcessingOptions::default();
        assert!(opts.enable_summary);
        assert!(opts.enable_extraction);
        assert_eq!(opts.confidence_threshold, 0.5);
        assert_eq!(opts.stage_timeout(), Duration::from_secs(30));
        assert_eq!(opts.language, "en");
    }

    #[test]
    fn options_partial_json_falls_back_to_defaults() {
        let opts: ProcessingOptions =
            serde_json::from_str(r#"{"enableExtraction": false}"#).unwrap();
        assert!(!opts.enable_extraction);
        assert!(opts.enable_summary);
        assert_eq!(opts.max_processing_time, 30_000);
    }

    #[test]
    fn provider_consult_flag() {
        let mut check = SafetyCheck {
            passed: true,
            warnings: vec![],
            requires_human_review: false,
            risk_level: RiskLevel::Low,
            reasons: vec![],
        };
        assert!(!check.requires_provider_consult());
        check.requires_human_review = true;
        assert!(check.requires_provider_consult());
        check.requires_human_review = false;
        check.passed = false;
        assert!(check.requires_provider_consult());
    }

    #[test]
    fn status_omits_missing_estimate() {
        let status = ProcessingStatus {
            correlation_id: "doc_1_a".into(),
            stage: ProcessingStage::Parsing,
            progress: 10,
            message: "Parsing document".into(),
            estimated_time_remaining_ms: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("estimatedTimeRemainingMs"));
        assert!(json.contains("\"correlationId\""));
    }
}
