use serde::{Deserialize, Serialize};

use super::{DateKind, TestStatus};

/// Typed fields extracted from a document. Every item carries a
/// confidence in [0, 1]; empty lists are a valid result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredData {
    pub dates: Vec<ExtractedDate>,
    pub medications: Vec<Medication>,
    pub test_results: Vec<TestResult>,
    pub diagnoses: Vec<Diagnosis>,
    pub providers: Vec<Provider>,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDate {
    /// Normalized to `YYYY-MM-DD` when the source format is recognized.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: DateKind,
    pub description: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    pub purpose: String,
    pub side_effects: Vec<String>,
    pub interactions: Vec<String>,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    pub value: String,
    pub unit: String,
    pub normal_range: String,
    pub status: TestStatus,
    pub date: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub name: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    pub specialty: String,
    pub contact: Option<String>,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub date: String,
    pub provider: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub notes: Option<String>,
    pub confidence: f32,
}

impl StructuredData {
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    pub fn item_count(&self) -> usize {
        self.dates.len()
            + self.medications.len()
            + self.test_results.len()
            + self.diagnoses.len()
            + self.providers.len()
            + self.appointments.len()
    }

    /// Every per-item confidence, in field order.
    pub fn confidences(&self) -> impl Iterator<Item = f32> + '_ {
        self.dates
            .iter()
            .map(|d| d.confidence)
            .chain(self.medications.iter().map(|m| m.confidence))
            .chain(self.test_results.iter().map(|t| t.confidence))
            .chain(self.diagnoses.iter().map(|d| d.confidence))
            .chain(self.providers.iter().map(|p| p.confidence))
            .chain(self.appointments.iter().map(|a| a.confidence))
    }
}
