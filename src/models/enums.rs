use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire name used by serde is the same literal returned by `as_str`.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// Closed genre classification of a medical document.
    DocumentType {
        LabReport => "lab_report",
        Prescription => "prescription",
        Radiology => "radiology",
        ConsultationNotes => "consultation_notes",
        DischargeSummary => "discharge_summary",
        InsuranceClaim => "insurance_claim",
        Unknown => "unknown",
    }
);

str_enum!(
    /// Ordered so that `max()` escalates: low < medium < high.
    RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

str_enum!(TestStatus {
    Normal => "normal",
    Abnormal => "abnormal",
    Critical => "critical",
});

str_enum!(DateKind {
    Test => "test",
    Appointment => "appointment",
    Prescription => "prescription",
    Procedure => "procedure",
});

str_enum!(Severity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(SourceType {
    Original => "original",
    Extracted => "extracted",
    Inferred => "inferred",
});

str_enum!(
    /// Orchestrator state. `Complete` and `Error` are terminal.
    ProcessingStage {
        Parsing => "parsing",
        Analyzing => "analyzing",
        Summarizing => "summarizing",
        Extracting => "extracting",
        Validating => "validating",
        Complete => "complete",
        Error => "error",
    }
);

impl DocumentType {
    /// Every type except `Unknown`.
    pub fn known() -> impl Iterator<Item = DocumentType> {
        Self::ALL.iter().copied().filter(|t| *t != DocumentType::Unknown)
    }
}

impl ProcessingStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}
