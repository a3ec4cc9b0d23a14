// Partial decoding of extraction responses. Each list and each item is
// decoded on its own; whatever fails is dropped and the rest is kept.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::models::{
    Appointment, DateKind, Diagnosis, ExtractedDate, Medication, Provider, StructuredData,
    TestResult, TestStatus,
};
use crate::pipeline::doc_spec::{DocumentSpec, ExtractionField};
use crate::pipeline::generation::{
    lenient, lenient_f32, lenient_string, lenient_string_list, parse_array_lenient,
    parse_json_object, GenerationError,
};

use super::validation::derive_test_status;

/// Confidence assigned to items the backend returned without a score.
pub const DEFAULT_ITEM_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawExtraction {
    #[serde(deserialize_with = "lenient")]
    dates: Vec<Value>,
    #[serde(deserialize_with = "lenient")]
    medications: Vec<Value>,
    #[serde(alias = "test_results", alias = "labResults", deserialize_with = "lenient")]
    test_results: Vec<Value>,
    #[serde(deserialize_with = "lenient")]
    diagnoses: Vec<Value>,
    #[serde(deserialize_with = "lenient")]
    providers: Vec<Value>,
    #[serde(deserialize_with = "lenient")]
    appointments: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawDate {
    #[serde(deserialize_with = "lenient_string")]
    date: Option<String>,
    #[serde(rename = "type", alias = "kind", deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawMedication {
    #[serde(alias = "medication", deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(alias = "dose", deserialize_with = "lenient_string")]
    dosage: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    frequency: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    duration: Option<String>,
    #[serde(alias = "reason", deserialize_with = "lenient_string")]
    purpose: Option<String>,
    #[serde(alias = "side_effects", deserialize_with = "lenient_string_list")]
    side_effects: Vec<String>,
    #[serde(deserialize_with = "lenient_string_list")]
    interactions: Vec<String>,
    #[serde(deserialize_with = "lenient_f32")]
    confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawTestResult {
    #[serde(alias = "test", deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(alias = "result", deserialize_with = "lenient_string")]
    value: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    unit: Option<String>,
    #[serde(alias = "normal_range", alias = "range", deserialize_with = "lenient_string")]
    normal_range: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    date: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDiagnosis {
    #[serde(alias = "diagnosis", deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProvider {
    #[serde(deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    specialty: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    contact: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAppointment {
    #[serde(deserialize_with = "lenient_string")]
    date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    provider: Option<String>,
    #[serde(rename = "type", alias = "kind", deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    notes: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    confidence: Option<f32>,
}

fn score(confidence: Option<f32>) -> f32 {
    confidence.unwrap_or(DEFAULT_ITEM_CONFIDENCE)
}

impl RawDate {
    fn into_model(self, default_kind: DateKind) -> Option<ExtractedDate> {
        Some(ExtractedDate {
            date: self.date?,
            kind: self
                .kind
                .and_then(|k| DateKind::from_str(&k.to_lowercase()).ok())
                .unwrap_or(default_kind),
            description: self.description.unwrap_or_default(),
            confidence: score(self.confidence),
        })
    }
}

impl RawMedication {
    fn into_model(self) -> Option<Medication> {
        Some(Medication {
            name: self.name?,
            dosage: self.dosage.unwrap_or_default(),
            frequency: self.frequency.unwrap_or_default(),
            duration: self.duration,
            purpose: self.purpose.unwrap_or_default(),
            side_effects: self.side_effects,
            interactions: self.interactions,
            confidence: score(self.confidence),
        })
    }
}

impl RawTestResult {
    fn into_model(self) -> Option<TestResult> {
        let name = self.name?;
        let value = self.value?;
        let normal_range = self.normal_range.unwrap_or_default();
        // Unknown status with no comparable range is flagged rather than
        // reported as normal.
        let status = self
            .status
            .and_then(|s| TestStatus::from_str(&s.to_lowercase()).ok())
            .or_else(|| derive_test_status(&value, &normal_range))
            .unwrap_or(TestStatus::Abnormal);
        Some(TestResult {
            name,
            value,
            unit: self.unit.unwrap_or_default(),
            normal_range,
            status,
            date: self.date.unwrap_or_default(),
            confidence: score(self.confidence),
        })
    }
}

impl RawProvider {
    fn into_model(self) -> Option<Provider> {
        Some(Provider {
            name: self.name?,
            specialty: self.specialty.unwrap_or_default(),
            contact: self.contact,
            confidence: score(self.confidence),
        })
    }
}

impl RawAppointment {
    fn into_model(self) -> Option<Appointment> {
        if self.date.is_none() && self.provider.is_none() {
            return None;
        }
        Some(Appointment {
            date: self.date.unwrap_or_default(),
            provider: self.provider.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            notes: self.notes,
            confidence: score(self.confidence),
        })
    }
}

fn diagnosis_from_value(value: &Value) -> Option<Diagnosis> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(Diagnosis {
            name: s.trim().to_string(),
            confidence: DEFAULT_ITEM_CONFIDENCE,
        }),
        Value::Object(_) => {
            let raw: RawDiagnosis = serde_json::from_value(value.clone()).ok()?;
            Some(Diagnosis {
                name: raw.name?,
                confidence: score(raw.confidence),
            })
        }
        _ => None,
    }
}

/// Decode an extraction response into `StructuredData`, keeping only the
/// lists `spec` asks for. Fails only when no JSON object is present.
pub fn parse_extraction_response(
    response: &str,
    spec: &DocumentSpec,
) -> Result<StructuredData, GenerationError> {
    let value = parse_json_object(response)
        .ok_or_else(|| GenerationError::MalformedResponse("No JSON object found".into()))?;
    let raw: RawExtraction = serde_json::from_value(value)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let mut data = StructuredData::default();

    if spec.wants(ExtractionField::Dates) {
        data.dates = parse_array_lenient::<RawDate>(&raw.dates)
            .into_iter()
            .filter_map(|d| d.into_model(spec.date_kind))
            .collect();
    }
    if spec.wants(ExtractionField::Medications) {
        data.medications = parse_array_lenient::<RawMedication>(&raw.medications)
            .into_iter()
            .filter_map(RawMedication::into_model)
            .collect();
    }
    if spec.wants(ExtractionField::TestResults) {
        data.test_results = parse_array_lenient::<RawTestResult>(&raw.test_results)
            .into_iter()
            .filter_map(RawTestResult::into_model)
            .collect();
    }
    if spec.wants(ExtractionField::Diagnoses) {
        data.diagnoses = raw.diagnoses.iter().filter_map(diagnosis_from_value).collect();
    }
    if spec.wants(ExtractionField::Providers) {
        data.providers = parse_array_lenient::<RawProvider>(&raw.providers)
            .into_iter()
            .filter_map(RawProvider::into_model)
            .collect();
    }
    if spec.wants(ExtractionField::Appointments) {
        data.appointments = parse_array_lenient::<RawAppointment>(&raw.appointments)
            .into_iter()
            .filter_map(RawAppointment::into_model)
            .collect();
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;

    fn spec(t: DocumentType) -> &'static DocumentSpec {
        DocumentSpec::for_type(t)
    }

    #[test]
    fn parses_lab_report_response() {
        let response = r#"```json
{
  "dates": [{"date": "2025-01-15", "type": "test", "description": "Laboratory blood work", "confidence": 0.95}],
  "testResults": [
    {"name": "LDL Cholesterol", "value": "110", "unit": "mg/dL", "normalRange": "<100", "status": "abnormal", "date": "2025-01-15", "confidence": 0.97},
    {"name": "HDL Cholesterol", "value": "52", "unit": "mg/dL", "normalRange": ">40", "status": "normal", "date": "2025-01-15", "confidence": 0.96}
  ],
  "providers": [{"name": "Dr. Sarah Johnson", "specialty": "Internal Medicine", "contact": null, "confidence": 0.9}]
}
```"#;
        let data = parse_extraction_response(response, spec(DocumentType::LabReport)).unwrap();
        assert_eq!(data.dates.len(), 1);
        assert_eq!(data.test_results.len(), 2);
        assert_eq!(data.test_results[0].status, TestStatus::Abnormal);
        assert_eq!(data.providers[0].contact, None);
        assert!(data.medications.is_empty());
    }

    #[test]
    fn bad_list_does_not_sink_the_rest() {
        let response = r#"{
            "dates": "January",
            "medications": [{"name": "Lisinopril", "dosage": "10 mg"}],
            "diagnoses": ["Hypertension", {"name": "Type 2 diabetes", "confidence": "0.7"}, 42, {"code": "I10"}],
            "providers": [{"specialty": "Cardiology"}]
        }"#;
        let data =
            parse_extraction_response(response, spec(DocumentType::ConsultationNotes)).unwrap();
        assert!(data.dates.is_empty());
        assert_eq!(data.medications.len(), 1);
        assert_eq!(data.medications[0].confidence, DEFAULT_ITEM_CONFIDENCE);
        assert_eq!(data.medications[0].frequency, "");
        assert_eq!(data.diagnoses.len(), 2);
        assert_eq!(data.diagnoses[1].confidence, 0.7);
        assert!(data.providers.is_empty());
    }

    #[test]
    fn unwanted_lists_are_ignored() {
        let response = r#"{"medications": [{"name": "Aspirin"}], "dates": []}"#;
        let data = parse_extraction_response(response, spec(DocumentType::Radiology)).unwrap();
        assert!(data.medications.is_empty());
    }

    #[test]
    fn missing_date_kind_uses_document_default() {
        let response = r#"{"dates": [{"date": "2025-03-02", "type": "someday"}, {"date": "2025-03-03"}]}"#;
        let data = parse_extraction_response(response, spec(DocumentType::Prescription)).unwrap();
        assert!(data.dates.iter().all(|d| d.kind == DateKind::Prescription));
    }

    #[test]
    fn missing_status_is_derived_from_range() {
        let response = r#"{"testResults": [
            {"name": "Glucose", "value": "92", "normalRange": "70-99"},
            {"name": "LDL", "value": "110 mg/dL", "normalRange": "<100"},
            {"name": "Note", "value": "see comment"}
        ]}"#;
        let data = parse_extraction_response(response, spec(DocumentType::LabReport)).unwrap();
        assert_eq!(data.test_results[0].status, TestStatus::Normal);
        assert_eq!(data.test_results[1].status, TestStatus::Abnormal);
        assert_eq!(data.test_results[2].status, TestStatus::Abnormal);
    }

    #[test]
    fn appointments_need_date_or_provider() {
        let response = r#"{"appointments": [{"type": "follow-up"}, {"provider": "Dr. Lisa Wang", "type": "follow-up"}]}"#;
        let data = parse_extraction_response(response, spec(DocumentType::DischargeSummary)).unwrap();
        assert_eq!(data.appointments.len(), 1);
        assert_eq!(data.appointments[0].date, "");
    }

    #[test]
    fn no_json_is_malformed() {
        assert!(matches!(
            parse_extraction_response("nothing here", spec(DocumentType::Unknown)),
            Err(GenerationError::MalformedResponse(_))
        ));
    }
}
