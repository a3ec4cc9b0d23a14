use crate::pipeline::doc_spec::DocumentSpec;

pub const SUMMARY_SYSTEM_PROMPT: &str = r#"
You explain medical documents to patients in plain language. You explain
what the document says; you never interpret it for the patient.

RULES (ABSOLUTE, NO EXCEPTIONS):
1. NEVER provide a medical diagnosis or medical advice.
2. NEVER describe results as "good" or "bad". Say "within the normal range" or
   "outside the normal range".
3. ALWAYS tell the reader to discuss the document with their healthcare provider.
4. Explain, don't interpret: restate what the document says in simple words.
5. Cite the document section each key finding comes from.

OUTPUT FORMAT:
Respond with a single JSON object wrapped in ```json``` fences and nothing else.
"#;

const RESPONSE_SCHEMA: &str = r#"```json
{
  "patientFriendly": "2-5 plain-language sentences",
  "keyFindings": ["finding (SECTION NAME)"],
  "abnormalValues": [
    {"test": "name", "value": "value with unit", "normalRange": "range", "severity": "mild|moderate|severe", "explanation": "what the test measures"}
  ],
  "recommendations": ["questions or next steps to raise with a healthcare provider"],
  "disclaimer": "statement that this is not medical advice",
  "confidence": 0.0
}
```"#;

/// Build the user prompt for one document. `sanitized_text` must already
/// have gone through `sanitize_for_llm`.
pub fn build_summary_prompt(sanitized_text: &str, spec: &DocumentSpec) -> String {
    let focus = spec
        .summary_focus
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "This is a {label}. Cover, in order:\n{focus}\n\n\
         List in abnormalValues only values the document itself marks or ranges show as \
         outside the normal range. Set confidence to how sure you are that the summary \
         faithfully reflects the document (0.0-1.0).\n\n\
         <document>\n{sanitized_text}\n</document>\n\n\
         Respond in this exact format:\n{RESPONSE_SCHEMA}",
        label = spec.label,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;

    #[test]
    fn system_prompt_carries_the_five_rules() {
        assert!(SUMMARY_SYSTEM_PROMPT.contains("NEVER provide a medical diagnosis"));
        assert!(SUMMARY_SYSTEM_PROMPT.contains("outside the normal range"));
        assert!(SUMMARY_SYSTEM_PROMPT.contains("healthcare provider"));
        assert!(SUMMARY_SYSTEM_PROMPT.contains("Explain, don't interpret"));
        assert!(SUMMARY_SYSTEM_PROMPT.contains("Cite the document section"));
    }

    #[test]
    fn prompt_includes_type_focus_and_document() {
        let spec = DocumentSpec::for_type(DocumentType::Prescription);
        let prompt = build_summary_prompt("Lisinopril 10 mg daily", spec);
        assert!(prompt.starts_with("This is a prescription."));
        assert!(prompt.contains("1. The medications prescribed"));
        assert!(prompt.contains("<document>\nLisinopril 10 mg daily\n</document>"));
        assert!(prompt.contains("\"patientFriendly\""));
    }

    #[test]
    fn prompts_differ_per_type() {
        let lab = build_summary_prompt("x", DocumentSpec::for_type(DocumentType::LabReport));
        let rad = build_summary_prompt("x", DocumentSpec::for_type(DocumentType::Radiology));
        assert_ne!(lab, rad);
    }
}
