//! Per-document-type generation records: what the summary should
//! cover, which structured fields to extract, and the standard disclaimer.

use crate::models::{DateKind, DocumentType};

/// A structured-data list the extractor can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionField {
    Dates,
    Medications,
    TestResults,
    Diagnoses,
    Providers,
    Appointments,
}

impl ExtractionField {
    /// JSON key in the backend response.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Dates => "dates",
            Self::Medications => "medications",
            Self::TestResults => "testResults",
            Self::Diagnoses => "diagnoses",
            Self::Providers => "providers",
            Self::Appointments => "appointments",
        }
    }

    /// Item shape shown to the backend.
    pub fn schema(&self, date_kind: DateKind) -> String {
        match self {
            Self::Dates => format!(
                r#"[{{"date": "YYYY-MM-DD", "type": "{}", "description": "what happened", "confidence": 0.0}}]"#,
                date_kind.as_str()
            ),
            Self::Medications => r#"[{"name": "drug name", "dosage": "amount", "frequency": "how often", "duration": "how long or null", "purpose": "what for", "sideEffects": ["effect"], "interactions": ["interaction"], "confidence": 0.0}]"#.into(),
            Self::TestResults => r#"[{"name": "test name", "value": "result", "unit": "unit", "normalRange": "range", "status": "normal|abnormal|critical", "date": "YYYY-MM-DD", "confidence": 0.0}]"#.into(),
            Self::Diagnoses => r#"[{"name": "diagnosis exactly as written", "confidence": 0.0}]"#.into(),
            Self::Providers => r#"[{"name": "provider name", "specialty": "specialty", "contact": "contact or null", "confidence": 0.0}]"#.into(),
            Self::Appointments => r#"[{"date": "YYYY-MM-DD", "provider": "who", "type": "visit type", "notes": "notes or null", "confidence": 0.0}]"#.into(),
        }
    }
}

/// Specification record for one document type.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSpec {
    pub document_type: DocumentType,
    /// Human-readable genre used in prompts.
    pub label: &'static str,
    /// What a summary of this genre must explain, in order.
    pub summary_focus: &'static [&'static str],
    pub fields: &'static [ExtractionField],
    /// Kind assigned to dates found in this genre.
    pub date_kind: DateKind,
    /// Used whenever the generated disclaimer is missing or too short.
    pub disclaimer: &'static str,
}

use ExtractionField::*;

const LAB_REPORT: DocumentSpec = DocumentSpec {
    document_type: DocumentType::LabReport,
    label: "laboratory report",
    summary_focus: &[
        "A brief explanation of what tests were performed",
        "Which values are within normal ranges and which are outside normal ranges",
        "Simple explanations of what each test measures",
        "A clear statement that results should be discussed with a healthcare provider",
    ],
    fields: &[Dates, TestResults, Providers],
    date_kind: DateKind::Test,
    disclaimer: "This summary is for educational purposes only and is not medical advice. \
        Please discuss all results with your healthcare provider who can provide personalized \
        medical guidance based on your complete health picture.",
};

const PRESCRIPTION: DocumentSpec = DocumentSpec {
    document_type: DocumentType::Prescription,
    label: "prescription",
    summary_focus: &[
        "The medications prescribed",
        "What each medication is typically used for, in plain language",
        "The dosing instructions as written, in plain language",
        "A reminder to follow the prescriber's instructions exactly",
        "A suggestion to ask a pharmacist about side effects",
    ],
    fields: &[Dates, Medications, Providers],
    date_kind: DateKind::Prescription,
    disclaimer: "This information is for educational purposes only. Always follow your \
        prescriber's instructions exactly. Contact your healthcare provider or pharmacist if you \
        have questions about your medications.",
};

const RADIOLOGY: DocumentSpec = DocumentSpec {
    document_type: DocumentType::Radiology,
    label: "radiology report",
    summary_focus: &[
        "What type of imaging was performed",
        "What body parts were examined",
        "The key findings restated in non-technical terms",
        "A clear statement that images should be reviewed with a healthcare provider",
    ],
    fields: &[Dates, Providers],
    date_kind: DateKind::Procedure,
    disclaimer: "This summary explains the radiology report in simple terms but is not a \
        substitute for medical interpretation. Your healthcare provider can best explain what \
        these results mean for your specific health situation.",
};

const CONSULTATION_NOTES: DocumentSpec = DocumentSpec {
    document_type: DocumentType::ConsultationNotes,
    label: "consultation note",
    summary_focus: &[
        "The purpose of the visit",
        "Key points discussed, in simple terms",
        "Any follow-up instructions mentioned",
        "A reminder to follow the healthcare provider's guidance",
    ],
    fields: &[Dates, Medications, Diagnoses, Providers, Appointments],
    date_kind: DateKind::Appointment,
    disclaimer: "Consultation notes are best understood in the context of your complete medical \
        care. Please discuss the contents with your healthcare provider for proper interpretation \
        and guidance.",
};

const DISCHARGE_SUMMARY: DocumentSpec = DocumentSpec {
    document_type: DocumentType::DischargeSummary,
    label: "hospital discharge summary",
    summary_focus: &[
        "The reason for the hospital stay, in simple terms",
        "Key treatments received",
        "Important discharge instructions as written",
        "Follow-up care mentioned in the document",
    ],
    fields: &[Dates, Medications, Diagnoses, Providers, Appointments],
    date_kind: DateKind::Procedure,
    disclaimer: "Discharge instructions are specific to your medical situation. Follow them \
        exactly as written and contact your healthcare team with any questions or concerns.",
};

const INSURANCE_CLAIM: DocumentSpec = DocumentSpec {
    document_type: DocumentType::InsuranceClaim,
    label: "insurance claim or billing statement",
    summary_focus: &[
        "Which services the document covers and when they took place",
        "The amounts billed, covered and owed, as written",
        "Any codes or diagnoses listed, restated without interpretation",
        "A suggestion to contact the insurer or provider about billing questions",
    ],
    fields: &[Dates, Diagnoses, Providers],
    date_kind: DateKind::Procedure,
    disclaimer: "This summary restates your insurance document for convenience only. Contact \
        your insurer or healthcare provider to confirm coverage and any amounts you owe.",
};

const UNKNOWN: DocumentSpec = DocumentSpec {
    document_type: DocumentType::Unknown,
    label: "medical document",
    summary_focus: &[
        "What kind of document this appears to be",
        "The main information it contains, in plain language",
        "A clear statement that the document should be reviewed with a healthcare provider",
    ],
    fields: &[Dates, Medications, TestResults, Diagnoses, Providers, Appointments],
    date_kind: DateKind::Test,
    disclaimer: "This summary is for educational purposes only and is not medical advice. \
        Please review the original document with your healthcare provider.",
};

impl DocumentSpec {
    pub fn for_type(document_type: DocumentType) -> &'static DocumentSpec {
        match document_type {
            DocumentType::LabReport => &LAB_REPORT,
            DocumentType::Prescription => &PRESCRIPTION,
            DocumentType::Radiology => &RADIOLOGY,
            DocumentType::ConsultationNotes => &CONSULTATION_NOTES,
            DocumentType::DischargeSummary => &DISCHARGE_SUMMARY,
            DocumentType::InsuranceClaim => &INSURANCE_CLAIM,
            DocumentType::Unknown => &UNKNOWN,
        }
    }

    pub fn wants(&self, field: ExtractionField) -> bool {
        self.fields.contains(&field)
    }
}
