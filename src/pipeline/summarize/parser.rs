use std::str::FromStr;

use serde::Deserialize;

use crate::models::{AbnormalValue, MedicalSummary, Severity};
use crate::pipeline::doc_spec::DocumentSpec;
use crate::pipeline::generation::{
    clamp_confidence, lenient, lenient_f32, lenient_string, lenient_string_list,
    parse_array_lenient, parse_json_object, GenerationError,
};

/// Confidence assumed when the backend does not report one.
pub const DEFAULT_SUMMARY_CONFIDENCE: f32 = 0.75;

const MAX_LIST_ITEMS: usize = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSummary {
    #[serde(alias = "patient_friendly", deserialize_with = "lenient_string")]
    patient_friendly: Option<String>,
    #[serde(alias = "key_findings", deserialize_with = "lenient_string_list")]
    key_findings: Vec<String>,
    #[serde(alias = "abnormal_values", deserialize_with = "lenient")]
    abnormal_values: Vec<serde_json::Value>,
    #[serde(deserialize_with = "lenient_string_list")]
    recommendations: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    disclaimer: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawAbnormalValue {
    #[serde(alias = "name", deserialize_with = "lenient_string")]
    test: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    value: Option<String>,
    #[serde(alias = "normal_range", deserialize_with = "lenient_string")]
    normal_range: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    severity: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    explanation: Option<String>,
}

impl RawAbnormalValue {
    fn into_model(self) -> Option<AbnormalValue> {
        Some(AbnormalValue {
            test: self.test?,
            value: self.value?,
            normal_range: self.normal_range.unwrap_or_default(),
            // Unrecognized severities are not silently downgraded to mild.
            severity: self
                .severity
                .and_then(|s| Severity::from_str(&s.to_lowercase()).ok())
                .unwrap_or(Severity::Moderate),
            explanation: self.explanation.unwrap_or_default(),
        })
    }
}

/// Parse a summary response. Fields decode independently; only a missing
/// `patientFriendly` text fails the whole response.
///
/// Returns the summary and the clamped self-reported confidence.
pub fn parse_summary_response(
    response: &str,
    spec: &DocumentSpec,
) -> Result<(MedicalSummary, f32), GenerationError> {
    let value = parse_json_object(response)
        .ok_or_else(|| GenerationError::MalformedResponse("No JSON object found".into()))?;
    let raw: RawSummary = serde_json::from_value(value)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let patient_friendly = raw
        .patient_friendly
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| GenerationError::MalformedResponse("Empty patientFriendly".into()))?;

    let abnormal_values = parse_array_lenient::<RawAbnormalValue>(&raw.abnormal_values)
        .into_iter()
        .filter_map(RawAbnormalValue::into_model)
        .take(MAX_LIST_ITEMS)
        .collect();

    let disclaimer = raw
        .disclaimer
        .filter(|d| d.trim().chars().count() >= crate::models::MIN_DISCLAIMER_LENGTH)
        .unwrap_or_else(|| spec.disclaimer.to_string());

    let summary = MedicalSummary {
        patient_friendly,
        key_findings: cap(raw.key_findings),
        abnormal_values,
        recommendations: cap(raw.recommendations),
        disclaimer,
    };
    let confidence = clamp_confidence(raw.confidence.unwrap_or(DEFAULT_SUMMARY_CONFIDENCE));

    Ok((summary, confidence))
}

fn cap(items: Vec<String>) -> Vec<String> {
    items.into_iter().take(MAX_LIST_ITEMS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;

    fn lab_spec() -> &'static DocumentSpec {
        DocumentSpec::for_type(DocumentType::LabReport)
    }

    #[test]
    fn parses_complete_response() {
        let response = r#"Here is the summary:
```json
{
  "patientFriendly": "This report lists a lipid panel. One value is outside the normal range.",
  "keyFindings": ["LDL cholesterol is 110 mg/dL (LIPID PANEL)"],
  "abnormalValues": [
    {"test": "LDL Cholesterol", "value": "110 mg/dL", "normalRange": "<100 mg/dL", "severity": "mild", "explanation": "LDL is one type of cholesterol in the blood."}
  ],
  "recommendations": ["Discuss these results with your healthcare provider"],
  "disclaimer": "This summary is for educational purposes only and is not medical advice.",
  "confidence": 0.82
}
```"#;
        let (summary, confidence) = parse_summary_response(response, lab_spec()).unwrap();
        assert_eq!(summary.key_findings.len(), 1);
        assert_eq!(summary.abnormal_values.len(), 1);
        assert_eq!(summary.abnormal_values[0].severity, Severity::Mild);
        assert_eq!(confidence, 0.82);
    }

    #[test]
    fn bad_fields_are_dropped_individually() {
        let response = r#"{
            "patientFriendly": "Your results are listed below.",
            "keyFindings": "Glucose is within the normal range",
            "abnormalValues": [{"value": "110"}, "LDL high", {"test": "HDL", "value": 38, "severity": "very"}],
            "recommendations": {"oops": true},
            "disclaimer": 12,
            "confidence": "high"
        }"#;
        let (summary, confidence) = parse_summary_response(response, lab_spec()).unwrap();
        assert_eq!(summary.key_findings, vec!["Glucose is within the normal range".to_string()]);
        assert_eq!(summary.abnormal_values.len(), 1);
        assert_eq!(summary.abnormal_values[0].value, "38");
        assert_eq!(summary.abnormal_values[0].severity, Severity::Moderate);
        assert!(summary.recommendations.is_empty());
        assert_eq!(summary.disclaimer, lab_spec().disclaimer);
        assert_eq!(confidence, DEFAULT_SUMMARY_CONFIDENCE);
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let response = r#"{"patient_friendly": "Text.", "key_findings": ["a"], "abnormal_values": []}"#;
        let (summary, _) = parse_summary_response(response, lab_spec()).unwrap();
        assert_eq!(summary.patient_friendly, "Text.");
        assert_eq!(summary.key_findings, vec!["a".to_string()]);
    }

    #[test]
    fn confidence_is_clamped() {
        let (_, confidence) =
            parse_summary_response(r#"{"patientFriendly": "x", "confidence": 4}"#, lab_spec())
                .unwrap();
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn missing_text_is_malformed() {
        let err = parse_summary_response(r#"{"keyFindings": ["a"]}"#, lab_spec()).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
        assert!(parse_summary_response("no json here", lab_spec()).is_err());
        assert!(parse_summary_response(r#"{"patientFriendly": "   "}"#, lab_spec()).is_err());
    }

    #[test]
    fn short_disclaimer_is_replaced() {
        let (summary, _) = parse_summary_response(
            r#"{"patientFriendly": "x", "disclaimer": "Not advice"}"#,
            DocumentSpec::for_type(DocumentType::Radiology),
        )
        .unwrap();
        assert!(summary.disclaimer.starts_with("This summary explains the radiology report"));
    }

    #[test]
    fn lists_are_capped() {
        let findings: Vec<String> = (0..25).map(|i| format!("\"finding {i}\"")).collect();
        let response = format!(
            r#"{{"patientFriendly": "x", "keyFindings": [{}]}}"#,
            findings.join(",")
        );
        let (summary, _) = parse_summary_response(&response, lab_spec()).unwrap();
        assert_eq!(summary.key_findings.len(), MAX_LIST_ITEMS);
    }
}
