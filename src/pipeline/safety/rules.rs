use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::SafetyError;

/// A named PII regex. Hits only ever produce a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiPattern {
    pub label: String,
    pub pattern: String,
}

/// Externally configurable safety rule set.
///
/// `Default` is the built-in rule set. JSON files extend it: listed
/// keywords and patterns are appended, scalar settings replace defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRules {
    /// Phase A: any hit makes the document high risk.
    pub dangerous_keywords: Vec<String>,
    /// Phase B: phrases that read as a diagnosis.
    pub diagnostic_phrases: Vec<String>,
    /// Phase B: case-insensitive regexes for treatment instructions.
    pub advice_patterns: Vec<String>,
    pub high_risk_medications: Vec<String>,
    pub corruption_markers: Vec<String>,
    pub pii_patterns: Vec<PiiPattern>,
    /// Shorter documents (in characters) count as incomplete.
    pub min_text_length: usize,
    /// A run of this many identical non-whitespace characters counts as an
    /// OCR or encoding artifact.
    pub max_repeated_run: usize,
    pub min_disclaimer_length: usize,
    pub confidence_threshold: f32,
}

impl Default for SafetyRules {
    fn default() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            dangerous_keywords: strings(&[
                "emergency",
                "urgent",
                "critical",
                "severe",
                "life-threatening",
                "cancer",
                "tumor",
                "malignant",
                "metastasis",
                "stroke",
                "heart attack",
                "overdose",
                "poisoning",
                "allergic reaction",
                "anaphylaxis",
            ]),
            diagnostic_phrases: strings(&[
                "you have",
                "diagnosed with",
                "suffering from",
                "condition is",
                "disease is",
                "illness is",
                "you are sick",
                "medical condition",
            ]),
            advice_patterns: strings(&[
                r"you should (take|stop|increase|decrease)",
                r"i recommend (taking|stopping)",
                r"the treatment is",
                r"you need to (start|stop)",
                r"this will cure",
                r"this will treat",
            ]),
            high_risk_medications: strings(&["warfarin", "insulin", "digoxin", "lithium"]),
            corruption_markers: strings(&["\u{FFFD}\u{FFFD}\u{FFFD}", "?????"]),
            pii_patterns: vec![
                PiiPattern {
                    label: "ssn".into(),
                    pattern: r"\d{3}-\d{2}-\d{4}".into(),
                },
                PiiPattern {
                    label: "phone".into(),
                    pattern: r"\(\d{3}\)\s*\d{3}-\d{4}".into(),
                },
                PiiPattern {
                    label: "email".into(),
                    pattern: r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b".into(),
                },
            ],
            min_text_length: 50,
            max_repeated_run: 6,
            min_disclaimer_length: crate::models::MIN_DISCLAIMER_LENGTH,
            confidence_threshold: 0.5,
        }
    }
}

/// Partial rule file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RulesFile {
    dangerous_keywords: Vec<String>,
    diagnostic_phrases: Vec<String>,
    advice_patterns: Vec<String>,
    high_risk_medications: Vec<String>,
    corruption_markers: Vec<String>,
    pii_patterns: Vec<PiiPattern>,
    min_text_length: Option<usize>,
    max_repeated_run: Option<usize>,
    min_disclaimer_length: Option<usize>,
    confidence_threshold: Option<f32>,
}

impl SafetyRules {
    /// Built-in rules extended by a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SafetyError> {
        let file: RulesFile =
            serde_json::from_str(json).map_err(|e| SafetyError::InvalidRules(e.to_string()))?;
        let mut rules = Self::default();
        rules.extend(file)?;
        Ok(rules)
    }

    pub fn from_path(path: &Path) -> Result<Self, SafetyError> {
        let json = std::fs::read_to_string(path).map_err(|source| SafetyError::RulesFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn extend(&mut self, file: RulesFile) -> Result<(), SafetyError> {
        fn append(target: &mut Vec<String>, extra: Vec<String>) {
            for item in extra {
                let item = item.trim().to_string();
                if !item.is_empty() && !target.iter().any(|t| t.eq_ignore_ascii_case(&item)) {
                    target.push(item);
                }
            }
        }

        append(&mut self.dangerous_keywords, file.dangerous_keywords);
        append(&mut self.diagnostic_phrases, file.diagnostic_phrases);
        append(&mut self.advice_patterns, file.advice_patterns);
        append(&mut self.high_risk_medications, file.high_risk_medications);
        append(&mut self.corruption_markers, file.corruption_markers);
        self.pii_patterns.extend(file.pii_patterns);

        if let Some(n) = file.min_text_length {
            self.min_text_length = n;
        }
        if let Some(n) = file.max_repeated_run {
            if n < 2 {
                return Err(SafetyError::InvalidRules(
                    "max_repeated_run must be at least 2".into(),
                ));
            }
            self.max_repeated_run = n;
        }
        if let Some(n) = file.min_disclaimer_length {
            self.min_disclaimer_length = n;
        }
        if let Some(t) = file.confidence_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(SafetyError::InvalidRules(format!(
                    "confidence_threshold {t} outside [0, 1]"
                )));
            }
            self.confidence_threshold = t;
        }
        Ok(())
    }

    /// Lowercase keyword lists and compile every regex once.
    pub fn compile(&self) -> Result<CompiledRules, SafetyError> {
        let lower = |items: &[String]| -> Vec<String> { items.iter().map(|s| s.to_lowercase()).collect() };

        let advice_patterns = self
            .advice_patterns
            .iter()
            .map(|p| compile_regex(&format!("(?i){p}")))
            .collect::<Result<Vec<_>, _>>()?;

        let pii_patterns = self
            .pii_patterns
            .iter()
            .map(|p| Ok((p.label.clone(), compile_regex(&p.pattern)?)))
            .collect::<Result<Vec<_>, SafetyError>>()?;

        Ok(CompiledRules {
            dangerous_keywords: lower(&self.dangerous_keywords),
            diagnostic_phrases: lower(&self.diagnostic_phrases),
            advice_patterns,
            high_risk_medications: lower(&self.high_risk_medications),
            corruption_markers: self.corruption_markers.clone(),
            pii_patterns,
            min_text_length: self.min_text_length,
            max_repeated_run: self.max_repeated_run,
            min_disclaimer_length: self.min_disclaimer_length,
            confidence_threshold: self.confidence_threshold,
        })
    }
}

fn compile_regex(pattern: &str) -> Result<Regex, SafetyError> {
    Regex::new(pattern).map_err(|e| SafetyError::RegexCompilation {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Rule set ready for matching. Immutable; share via `Arc`.
#[derive(Debug)]
pub struct CompiledRules {
    pub(crate) dangerous_keywords: Vec<String>,
    pub(crate) diagnostic_phrases: Vec<String>,
    pub(crate) advice_patterns: Vec<Regex>,
    pub(crate) high_risk_medications: Vec<String>,
    pub(crate) corruption_markers: Vec<String>,
    pub(crate) pii_patterns: Vec<(String, Regex)>,
    pub(crate) min_text_length: usize,
    pub(crate) max_repeated_run: usize,
    pub(crate) min_disclaimer_length: usize,
    pub(crate) confidence_threshold: f32,
}

/// Built-in rules, compiled on first use.
pub static BUILTIN_RULES: LazyLock<Arc<CompiledRules>> = LazyLock::new(|| {
    Arc::new(
        SafetyRules::default()
            .compile()
            .expect("built-in safety rules compile"),
    )
});
