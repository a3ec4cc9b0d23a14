use crate::pipeline::generation::remove_invisible_chars;

/// Sanitize extracted text before passing downstream.
/// Strips control and invisible characters, trims each line and drops
/// blank lines. U+FFFD is kept so corruption stays visible to the safety
/// checks.
pub fn sanitize_extracted_text(raw: &str) -> String {
    remove_invisible_chars(raw)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
