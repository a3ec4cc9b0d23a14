// Sanitize document text before it is embedded in a generation prompt.
// Removes prompt-injection lines and invisible Unicode, then truncates.

/// Maximum document length embedded in a prompt (characters).
pub const MAX_PROMPT_INPUT_CHARS: usize = 12_000;

const TRUNCATION_MARKER: &str = "…[TRUNCATED]";

/// Sanitize text for prompt embedding. `correlation_id` is only used for
/// audit logging; document content is never logged.
pub fn sanitize_for_llm(raw: &str, correlation_id: &str) -> String {
    let cleaned = remove_invisible_chars(raw);
    let (kept, removed) = remove_injection_lines(&cleaned);

    if removed > 0 {
        tracing::warn!(
            correlation_id = %correlation_id,
            removed_lines = removed,
            "Injection patterns detected and removed from document input"
        );
    }

    truncate_chars(&kept, MAX_PROMPT_INPUT_CHARS)
}

/// Remove zero-width, bidi-override and control characters.
/// Standard whitespace is preserved.
pub fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if matches!(*c, ' ' | '\n' | '\t' | '\r') {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}

fn is_injection_line(lower: &str) -> bool {
    const ROLE_MARKERS: &[&str] = &[
        "system:",
        "assistant:",
        "user:",
        "[system]",
        "[inst]",
        "[/inst]",
        "<<sys>>",
        "<system",
        "</system",
        "<instruction",
        "note to ai:",
    ];
    const OVERRIDES: &[&str] = &[
        "ignore previous instructions",
        "ignore all instructions",
        "ignore the above instructions",
        "disregard your instructions",
        "disregard all instructions",
        "forget your instructions",
        "new instructions:",
    ];

    ROLE_MARKERS.iter().any(|m| lower.starts_with(m))
        || OVERRIDES.iter().any(|o| lower.contains(o))
}

fn remove_injection_lines(text: &str) -> (String, usize) {
    let mut removed = 0usize;
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            let lower = line.trim().to_lowercase();
            if is_injection_line(&lower) {
                removed += 1;
                false
            } else {
                true
            }
        })
        .collect();
    (kept.join("\n"), removed)
}

/// Truncate to `max_chars` characters, breaking at the last whitespace.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head,
    };
    format!("{head}{TRUNCATION_MARKER}")
}
