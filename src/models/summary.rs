use serde::{Deserialize, Serialize};

use super::Severity;

/// Minimum disclaimer length accepted anywhere in the pipeline.
pub const MIN_DISCLAIMER_LENGTH: usize = 20;

/// Generated patient-facing explanation of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalSummary {
    pub patient_friendly: String,
    pub key_findings: Vec<String>,
    pub abnormal_values: Vec<AbnormalValue>,
    pub recommendations: Vec<String>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbnormalValue {
    pub test: String,
    pub value: String,
    pub normal_range: String,
    pub severity: Severity,
    pub explanation: String,
}

impl MedicalSummary {
    /// Fixed, non-generated summary used whenever generation is unsafe or
    /// fails. Always sends the reader to a clinician.
    pub fn fail_safe() -> Self {
        Self {
            patient_friendly: "This document could not be safely summarized by our AI system. \
                For your safety, please review the original document with your healthcare provider."
                .into(),
            key_findings: vec![
                "Document requires human review for safety".into(),
                "AI processing was not confident enough to provide summary".into(),
                "Original document should be reviewed by healthcare provider".into(),
            ],
            abnormal_values: vec![],
            recommendations: vec![
                "Schedule an appointment with your healthcare provider".into(),
                "Bring the original document to your appointment".into(),
                "Ask your provider to explain the contents".into(),
                "Request a copy for your personal records".into(),
            ],
            disclaimer: "For your safety, this document requires human medical expertise for \
                proper interpretation. Please consult with your healthcare provider."
                .into(),
        }
    }

    /// Placeholder for runs with summarization switched off.
    pub fn not_requested() -> Self {
        Self {
            patient_friendly: "A summary was not requested for this document.".into(),
            key_findings: vec![],
            abnormal_values: vec![],
            recommendations: vec!["Review the original document with your healthcare provider".into()],
            disclaimer: "No AI summary was generated. Please consult your healthcare provider \
                about the contents of this document."
                .into(),
        }
    }

    pub fn is_fail_safe(&self) -> bool {
        *self == Self::fail_safe()
    }

    pub fn has_valid_disclaimer(&self) -> bool {
        self.disclaimer.trim().chars().count() >= MIN_DISCLAIMER_LENGTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_safe_defers_to_provider() {
        let s = MedicalSummary::fail_safe();
        assert!(s.patient_friendly.contains("healthcare provider"));
        assert!(s.has_valid_disclaimer());
        assert!(s.abnormal_values.is_empty());
        assert!(s.is_fail_safe());
    }

    #[test]
    fn short_disclaimer_is_invalid() {
        let mut s = MedicalSummary::fail_safe();
        s.disclaimer = "  Not advice.  ".into();
        assert!(!s.has_valid_disclaimer());
        assert!(!s.is_fail_safe());
    }

    #[test]
    fn not_requested_still_carries_disclaimer() {
        let s = MedicalSummary::not_requested();
        assert!(s.has_valid_disclaimer());
        assert!(!s.is_fail_safe());
    }

    #[test]
    fn summary_wire_names() {
        let json = serde_json::to_value(MedicalSummary::fail_safe()).unwrap();
        assert!(json.get("patientFriendly").is_some());
        assert!(json.get("keyFindings").is_some());
        assert!(json.get("abnormalValues").is_some());
    }
}
