use super::types::Classification;
use crate::models::DocumentType;

/// Keyword weights per document type. Matching is case-insensitive
/// substring presence; each keyword counts once.
const SIGNALS: &[(DocumentType, &[(&str, u32)])] = &[
    (
        DocumentType::LabReport,
        &[
            ("laboratory", 3),
            ("lab report", 3),
            ("blood test", 2),
            ("lipid panel", 2),
            ("complete blood count", 2),
            ("chemistry panel", 2),
            ("reference range", 2),
            ("specimen", 1),
            ("glucose", 1),
            ("cholesterol", 1),
            ("hemoglobin", 1),
            ("mg/dl", 1),
        ],
    ),
    (
        DocumentType::Prescription,
        &[
            ("prescription", 3),
            ("pharmacy", 2),
            ("refills", 2),
            ("dispense", 2),
            ("sig:", 2),
            ("medication", 1),
            ("tablet", 1),
            ("capsule", 1),
            ("by mouth", 1),
        ],
    ),
    (
        DocumentType::Radiology,
        &[
            ("radiology", 3),
            ("radiologist", 2),
            ("x-ray", 2),
            ("ct scan", 2),
            ("mri", 2),
            ("ultrasound", 2),
            ("imaging", 2),
            ("impression", 1),
            ("contrast", 1),
        ],
    ),
    (
        DocumentType::ConsultationNotes,
        &[
            ("consultation", 3),
            ("chief complaint", 3),
            ("history of present illness", 3),
            ("physical exam", 2),
            ("examination", 2),
            ("assessment and plan", 2),
            ("visit", 1),
            ("follow-up", 1),
        ],
    ),
    (
        DocumentType::DischargeSummary,
        &[
            ("discharge summary", 3),
            ("discharge", 2),
            ("hospital course", 3),
            ("admission date", 2),
            ("admitted", 2),
            ("hospital", 1),
        ],
    ),
    (
        DocumentType::InsuranceClaim,
        &[
            ("insurance", 3),
            ("explanation of benefits", 3),
            ("policy number", 3),
            ("claim", 2),
            ("billing", 2),
            ("copay", 2),
            ("deductible", 2),
            ("amount billed", 2),
        ],
    ),
];

/// Score `text` against every document type.
///
/// Deterministic: identical text always yields the same classification.
/// No keyword hits, or a tie for the top score, yields `unknown` with
/// confidence 0.
pub fn classify_text(text: &str) -> Classification {
    let lower = text.to_lowercase();

    let scores: Vec<(DocumentType, u32)> = SIGNALS
        .iter()
        .map(|(doc_type, keywords)| {
            let score = keywords
                .iter()
                .filter(|(kw, _)| lower.contains(kw))
                .map(|(_, weight)| weight)
                .sum();
            (*doc_type, score)
        })
        .collect();

    let total: u32 = scores.iter().map(|(_, s)| s).sum();
    let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    if best == 0 {
        return Classification::unknown();
    }

    let mut leaders = scores.iter().filter(|(_, s)| *s == best);
    let (Some((document_type, _)), None) = (leaders.next(), leaders.next()) else {
        tracing::debug!(score = best, "Classification tie, falling back to unknown");
        return Classification::unknown();
    };

    Classification {
        document_type: *document_type,
        confidence: best as f32 / total as f32,
    }
}

/// Map a free-text label ("Lab Report", "radiology_report", "consultation")
/// onto the closed document type set. Unrecognized labels map to `unknown`.
pub fn parse_document_type_label(label: &str) -> DocumentType {
    let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
    match normalized.as_str() {
        "lab_report" | "lab_result" | "lab_results" | "lab" | "laboratory" | "blood_test" => {
            DocumentType::LabReport
        }
        "prescription" | "rx" | "pharmacy" | "pharmacy_record" | "medication_list" => {
            DocumentType::Prescription
        }
        "radiology" | "radiology_report" | "imaging" | "x_ray" | "xray" | "mri" | "ct" => {
            DocumentType::Radiology
        }
        "consultation_notes" | "consultation" | "consultation_note" | "clinical_note"
        | "clinical_notes" | "visit_note" => DocumentType::ConsultationNotes,
        "discharge_summary" | "discharge" | "discharge_papers" => DocumentType::DischargeSummary,
        "insurance_claim" | "insurance" | "claim" | "billing" | "eob" => {
            DocumentType::InsuranceClaim
        }
        _ => DocumentType::Unknown,
    }
}
