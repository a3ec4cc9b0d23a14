use crate::pipeline::doc_spec::DocumentSpec;

pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You extract structured data from medical documents.

RULES:
1. Return ONLY valid JSON. No commentary.
2. Extract only what is written in the document. Never infer, never guess.
3. Copy names, values, units and ranges exactly as written.
4. Write dates as YYYY-MM-DD when the document gives a full date.
5. Include confidence scores (0.0-1.0) for each extracted item.
6. Use an empty list for anything the document does not contain.
"#;

/// Build the extraction prompt listing only the fields wanted for this
/// document type.
pub fn build_extraction_prompt(sanitized_text: &str, spec: &DocumentSpec) -> String {
    let fields = spec
        .fields
        .iter()
        .map(|f| format!("  \"{}\": {}", f.key(), f.schema(spec.date_kind)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "Extract the following from this {label}:\n\
         ```json\n{{\n{fields}\n}}\n```\n\n\
         <document>\n{sanitized_text}\n</document>",
        label = spec.label,
    )
}
