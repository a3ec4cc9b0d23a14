use crate::models::{Citation, SourceType};

/// Longest citation excerpt before truncation.
pub const CITATION_EXCERPT_CHARS: usize = 100;

/// Confidence attached to citations from text-layer or typed input.
pub const PARSED_TEXT_CITATION_CONFIDENCE: f32 = 0.8;

/// Split each page into sections at ALL-CAPS heading lines and emit one
/// citation per non-empty section.
///
/// Text before the first heading on a page, or a page without headings,
/// gets a positional name (`Section N`).
pub fn build_citations(pages: &[String], confidence: f32) -> Vec<Citation> {
    let mut citations = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        let page_number = index + 1;
        let mut heading: Option<String> = None;
        let mut body: Vec<&str> = Vec::new();

        for line in page.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if is_heading(line) {
                push_section(&mut citations, heading.take(), &body, page_number, confidence);
                body.clear();
                heading = Some(line.trim_end_matches(':').trim().to_string());
            } else {
                body.push(line);
            }
        }
        push_section(&mut citations, heading, &body, page_number, confidence);
    }

    citations
}

fn push_section(
    citations: &mut Vec<Citation>,
    heading: Option<String>,
    body: &[&str],
    page: usize,
    confidence: f32,
) {
    if body.is_empty() {
        return;
    }
    let section = heading.unwrap_or_else(|| format!("Section {}", citations.len() + 1));
    citations.push(Citation {
        text: excerpt(&body.join(" ")),
        page: Some(page),
        section: Some(section),
        confidence: confidence.clamp(0.0, 1.0),
        source_type: SourceType::Original,
    });
}

/// A heading has at least four letters, no lowercase letters and no digits.
fn is_heading(line: &str) -> bool {
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 4
        && !line.chars().any(|c| c.is_lowercase() || c.is_ascii_digit())
        && line.chars().count() <= 80
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(CITATION_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> Vec<String> {
        vec![text.to_string()]
    }

    #[test]
    fn sections_follow_caps_headings() {
        let pages = page(
            "LIPID PANEL\nTotal Cholesterol: 185 mg/dL\nLDL Cholesterol: 110 mg/dL\nCHEMISTRY PANEL:\nGlucose: 95 mg/dL",
        );
        let citations = build_citations(&pages, 0.8);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].section.as_deref(), Some("LIPID PANEL"));
        assert_eq!(
            citations[0].text,
            "Total Cholesterol: 185 mg/dL LDL Cholesterol: 110 mg/dL"
        );
        assert_eq!(citations[1].section.as_deref(), Some("CHEMISTRY PANEL"));
        assert_eq!(citations[1].page, Some(1));
        assert_eq!(citations[1].source_type, SourceType::Original);
    }

    #[test]
    fn text_without_headings_gets_positional_section() {
        let pages = vec!["Glucose: 95 mg/dL".to_string(), "Sodium: 140 mmol/L".to_string()];
        let citations = build_citations(&pages, 0.8);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].section.as_deref(), Some("Section 1"));
        assert_eq!(citations[1].section.as_deref(), Some("Section 2"));
        assert_eq!(citations[1].page, Some(2));
    }

    #[test]
    fn value_lines_are_not_headings() {
        assert!(!is_heading("LDL: 110"));
        assert!(!is_heading("WBC"));
        assert!(!is_heading("Findings"));
        assert!(is_heading("IMPRESSION:"));
        assert!(is_heading("COMPLETE BLOOD COUNT"));
    }

    #[test]
    fn long_sections_are_truncated() {
        let body = "x".repeat(250);
        let citations = build_citations(&page(&format!("FINDINGS\n{body}")), 0.8);
        assert_eq!(citations[0].text.chars().count(), CITATION_EXCERPT_CHARS + 3);
        assert!(citations[0].text.ends_with("..."));
    }

    #[test]
    fn heading_without_body_is_skipped() {
        let citations = build_citations(&page("MEDICAL LABORATORY REPORT\nLIPID PANEL\nHDL: 55"), 0.8);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].section.as_deref(), Some("LIPID PANEL"));
    }

    #[test]
    fn confidence_is_clamped() {
        let citations = build_citations(&page("Hemoglobin 14.2"), 1.4);
        assert_eq!(citations[0].confidence, 1.0);
    }
}
