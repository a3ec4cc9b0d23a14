use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::rules::{CompiledRules, SafetyRules, BUILTIN_RULES};
use super::SafetyError;
use crate::models::{MedicalSummary, RiskLevel, SafetyCheck, StructuredData, TestStatus};

pub const WARN_URGENT_CONTENT: &str = "Document contains potentially urgent medical content";
pub const WARN_INCOMPLETE: &str = "Document appears incomplete or corrupted";
pub const WARN_PII: &str = "Document contains personal information - ensure privacy compliance";
pub const WARN_DIAGNOSTIC_LANGUAGE: &str =
    "Summary contains language that sounds like medical diagnosis";
pub const WARN_ADVICE_LANGUAGE: &str = "Summary contains language that sounds like medical advice";
pub const WARN_MISSING_DISCLAIMER: &str = "Summary lacks proper medical disclaimer";
pub const WARN_ADVICE_IN_RECOMMENDATIONS: &str =
    "Recommendations contain inappropriate medical advice";
pub const WARN_MULTIPLE_MEDICATIONS: &str =
    "Multiple medications detected - interaction checking recommended";

const REASON_HIGH: &str = "High-risk content detected that requires human medical expertise";
const REASON_MEDIUM: &str = "Medium-risk content that should be verified by healthcare provider";
const REASON_WARNINGS: &str = "Multiple safety warnings triggered during processing";
const REASON_SAFE: &str = "Content appears safe for AI processing with appropriate disclaimers";

/// Accumulates findings for one validation phase.
struct Findings {
    warnings: Vec<String>,
    risk: RiskLevel,
    human_review: bool,
}

impl Findings {
    fn new() -> Self {
        Self {
            warnings: Vec::new(),
            risk: RiskLevel::Low,
            human_review: false,
        }
    }

    fn flag(&mut self, warning: impl Into<String>, risk: RiskLevel) {
        self.warnings.push(warning.into());
        self.risk = self.risk.max(risk);
        if risk == RiskLevel::High {
            self.human_review = true;
        }
    }

    fn note(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    fn into_check(self, passed: bool) -> SafetyCheck {
        SafetyCheck {
            reasons: safety_reasons(&self.warnings, self.risk),
            passed,
            warnings: self.warnings,
            requires_human_review: self.human_review,
            risk_level: self.risk,
        }
    }
}

/// Active safety settings, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyConfig {
    pub confidence_threshold: f32,
    pub require_human_review_for_critical: bool,
    pub enable_diagnostic_language_check: bool,
    pub enable_medical_advice_check: bool,
    pub enable_pii_detection: bool,
    pub disclaimer_required: bool,
    pub min_disclaimer_length: usize,
    pub supported_languages: Vec<String>,
    pub dangerous_keyword_count: usize,
}

/// Two-phase safety gate. Cheap to clone; the rule set is shared.
#[derive(Debug, Clone)]
pub struct SafetyValidator {
    rules: Arc<CompiledRules>,
}

impl Default for SafetyValidator {
    fn default() -> Self {
        Self {
            rules: Arc::clone(&BUILTIN_RULES),
        }
    }
}

impl SafetyValidator {
    pub fn new(rules: &SafetyRules) -> Result<Self, SafetyError> {
        Ok(Self {
            rules: Arc::new(rules.compile()?),
        })
    }

    /// Default confidence threshold from the rule set.
    pub fn default_threshold(&self) -> f32 {
        self.rules.confidence_threshold
    }

    /// Phase A: validate parsed text before any generation.
    ///
    /// Dangerous keywords make the document high risk and require human
    /// review. Incomplete or corrupted text is at least medium risk. PII is
    /// a warning only.
    pub fn pre_validate(&self, text: &str) -> SafetyCheck {
        let mut findings = Findings::new();

        let keyword_hits = self.dangerous_keyword_hits(text);
        if keyword_hits > 0 {
            tracing::debug!(hits = keyword_hits, "Dangerous keywords found");
            findings.flag(WARN_URGENT_CONTENT, RiskLevel::High);
        }

        let issues = self.completeness_issues(text);
        if !issues.is_empty() {
            tracing::debug!(issues = ?issues, "Completeness check failed");
            findings.flag(WARN_INCOMPLETE, RiskLevel::Medium);
        }

        let pii = self.pii_kinds(text);
        if !pii.is_empty() {
            tracing::debug!(kinds = ?pii, "PII patterns found");
            findings.note(WARN_PII);
        }

        let passed = findings.risk != RiskLevel::High;
        findings.into_check(passed)
    }

    /// Phase B: validate generated output.
    ///
    /// `summary` / `data` are `None` when the corresponding stage was
    /// disabled. `confidence` is compared against `threshold` only when a
    /// non-empty summary exists.
    pub fn post_validate(
        &self,
        summary: Option<&MedicalSummary>,
        data: Option<&StructuredData>,
        confidence: f32,
        threshold: f32,
    ) -> SafetyCheck {
        let mut findings = Findings::new();
        // NaN would disable the comparison below; treat it as the strictest gate.
        let threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            1.0
        };

        if let Some(summary) = summary {
            self.check_summary(summary, &mut findings);
        }
        if let Some(data) = data {
            self.check_structured_data(data, &mut findings);
        }

        let has_summary_text = summary.is_some_and(|s| !s.patient_friendly.trim().is_empty());
        if has_summary_text && confidence < threshold {
            findings.flag(
                format!(
                    "AI confidence ({}%) below threshold ({}%)",
                    (confidence * 100.0).round() as i32,
                    (threshold * 100.0).round() as i32
                ),
                RiskLevel::Medium,
            );
            findings.human_review = true;
        }

        let passed = findings.risk != RiskLevel::High && !findings.human_review;
        findings.into_check(passed)
    }

    pub fn config(&self) -> SafetyConfig {
        SafetyConfig {
            confidence_threshold: self.rules.confidence_threshold,
            require_human_review_for_critical: true,
            enable_diagnostic_language_check: !self.rules.diagnostic_phrases.is_empty(),
            enable_medical_advice_check: !self.rules.advice_patterns.is_empty(),
            enable_pii_detection: !self.rules.pii_patterns.is_empty(),
            disclaimer_required: true,
            min_disclaimer_length: self.rules.min_disclaimer_length,
            supported_languages: vec!["en".into()],
            dangerous_keyword_count: self.rules.dangerous_keywords.len(),
        }
    }

    // ------------------------------------------------------------------
    // Phase A checks
    // ------------------------------------------------------------------

    fn dangerous_keyword_hits(&self, text: &str) -> usize {
        let lower = text.to_lowercase();
        self.rules
            .dangerous_keywords
            .iter()
            .filter(|kw| lower.contains(kw.as_str()))
            .count()
    }

    fn completeness_issues(&self, text: &str) -> Vec<&'static str> {
        let mut issues = Vec::new();
        if text.chars().count() < self.rules.min_text_length {
            issues.push("too_short");
        }
        if self
            .rules
            .corruption_markers
            .iter()
            .any(|m| text.contains(m.as_str()))
        {
            issues.push("corruption_marker");
        }
        if longest_repeated_run(text) >= self.rules.max_repeated_run {
            issues.push("repeated_characters");
        }
        issues
    }

    fn pii_kinds(&self, text: &str) -> Vec<&str> {
        self.rules
            .pii_patterns
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(label, _)| label.as_str())
            .collect()
    }

    // ------------------------------------------------------------------
    // Phase B checks
    // ------------------------------------------------------------------

    fn check_summary(&self, summary: &MedicalSummary, findings: &mut Findings) {
        if self.has_diagnostic_language(&summary.patient_friendly) {
            findings.flag(WARN_DIAGNOSTIC_LANGUAGE, RiskLevel::High);
        }
        if self.has_advice_language(&summary.patient_friendly) {
            findings.flag(WARN_ADVICE_LANGUAGE, RiskLevel::High);
        }
        if summary.disclaimer.trim().chars().count() < self.rules.min_disclaimer_length {
            findings.flag(WARN_MISSING_DISCLAIMER, RiskLevel::Medium);
        }
        for rec in &summary.recommendations {
            if self.has_advice_language(rec) {
                findings.flag(WARN_ADVICE_IN_RECOMMENDATIONS, RiskLevel::High);
            }
        }
    }

    fn check_structured_data(&self, data: &StructuredData, findings: &mut Findings) {
        for test in data.test_results.iter().filter(|t| t.status == TestStatus::Critical) {
            findings.flag(
                format!("Critical test result detected: {}", test.name),
                RiskLevel::High,
            );
        }

        if data.medications.len() > 1 {
            findings.note(WARN_MULTIPLE_MEDICATIONS);
        }

        for med in &data.medications {
            let name = med.name.to_lowercase();
            if self
                .rules
                .high_risk_medications
                .iter()
                .any(|risk| name.contains(risk.as_str()))
            {
                findings.flag(
                    format!("High-risk medication detected: {}", med.name),
                    RiskLevel::Medium,
                );
            }
        }
    }

    fn has_diagnostic_language(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.rules
            .diagnostic_phrases
            .iter()
            .any(|p| lower.contains(p.as_str()))
    }

    fn has_advice_language(&self, text: &str) -> bool {
        self.rules.advice_patterns.iter().any(|re| re.is_match(text))
    }
}

/// Fold phase A findings into the phase B check attached to a result, so
/// document-level warnings stay visible to the consumer.
pub fn combine_checks(pre: &SafetyCheck, post: SafetyCheck) -> SafetyCheck {
    let mut warnings = pre.warnings.clone();
    for w in post.warnings {
        if !warnings.contains(&w) {
            warnings.push(w);
        }
    }
    let risk = pre.risk_level.max(post.risk_level);
    SafetyCheck {
        passed: pre.passed && post.passed,
        requires_human_review: pre.requires_human_review || post.requires_human_review,
        reasons: safety_reasons(&warnings, risk),
        risk_level: risk,
        warnings,
    }
}

/// Length of the longest run of one repeated character within a line.
/// Spaces and tabs count; line breaks end a run.
pub fn longest_repeated_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
            prev = None;
            current = 0;
            continue;
        }
        if Some(c) == prev {
            current += 1;
        } else {
            prev = Some(c);
            current = 1;
        }
        longest = longest.max(current);
    }
    longest
}

/// Human-readable reasons derived from the final risk level and warnings.
fn safety_reasons(warnings: &[String], risk: RiskLevel) -> Vec<String> {
    let mut reasons = Vec::new();
    match risk {
        RiskLevel::High => reasons.push(REASON_HIGH.to_string()),
        RiskLevel::Medium => reasons.push(REASON_MEDIUM.to_string()),
        RiskLevel::Low => {}
    }
    if !warnings.is_empty() {
        reasons.push(REASON_WARNINGS.to_string());
    }
    if reasons.is_empty() {
        reasons.push(REASON_SAFE.to_string());
    }
    reasons
}
