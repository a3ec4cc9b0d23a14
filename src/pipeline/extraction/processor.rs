use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::citation::{build_citations, PARSED_TEXT_CITATION_CONFIDENCE};
use super::classify::classify_text;
use super::ocr::UnavailableOcr;
use super::pdf::LopdfExtractor;
use super::sanitize::sanitize_extracted_text;
use super::types::{Classification, DocumentSource, OcrEngine, OcrOutput, PdfExtractor};
use super::{OcrError, ParseError};
use crate::config::MAX_FILE_SIZE;
use crate::models::{DocumentMetadata, ParsedDocument};
use crate::pipeline::import::{detect_format_bytes, FileCategory};

/// Minimum trimmed characters for a PDF text layer to count as present.
const MIN_TEXT_LAYER_CHARS: usize = 10;

/// Longest derived title.
const MAX_TITLE_CHARS: usize = 120;

/// Parses documents into text, metadata and citations, and classifies
/// their genre. Stateless apart from its injected engines.
pub struct DocumentProcessor {
    ocr: Arc<dyn OcrEngine>,
    pdf: Arc<dyn PdfExtractor>,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(Arc::new(UnavailableOcr), Arc::new(LopdfExtractor))
    }
}

impl DocumentProcessor {
    pub fn new(ocr: Arc<dyn OcrEngine>, pdf: Arc<dyn PdfExtractor>) -> Self {
        Self { ocr, pdf }
    }

    /// Same PDF extractor, different OCR engine.
    pub fn with_ocr(ocr: Arc<dyn OcrEngine>) -> Self {
        Self::new(ocr, Arc::new(LopdfExtractor))
    }

    /// Parse a document. Fails on unreadable, corrupt or unsupported input.
    pub fn parse(&self, source: &DocumentSource) -> Result<ParsedDocument, ParseError> {
        match source {
            DocumentSource::File(path) => self.parse_file(path),
            DocumentSource::Text { content, title } => {
                let size = content.len() as u64;
                if size > MAX_FILE_SIZE {
                    return Err(ParseError::TooLarge {
                        size,
                        max: MAX_FILE_SIZE,
                    });
                }
                let text = sanitize_extracted_text(content);
                if text.is_empty() {
                    return Err(ParseError::EmptyDocument);
                }
                let pages = vec![text.clone()];
                let metadata = DocumentMetadata {
                    file_size: content.len() as u64,
                    format: "manual_entry".into(),
                    mime_type: Some("text/plain".into()),
                    title: title.clone().or_else(|| derive_title(&text)),
                    ..Default::default()
                };
                Ok(ParsedDocument {
                    citations: build_citations(&pages, PARSED_TEXT_CITATION_CONFIDENCE),
                    text,
                    pages: 1,
                    metadata,
                })
            }
        }
    }

    /// Classify document genre. Never fails; ambiguous input is `unknown`.
    pub fn classify(&self, text: &str) -> Classification {
        classify_text(text)
    }

    /// Run OCR on image bytes. Failures are recoverable by the caller.
    pub fn ocr(&self, image_bytes: &[u8]) -> Result<OcrOutput, OcrError> {
        let output = self.ocr.recognize(image_bytes)?;
        let text = sanitize_extracted_text(&output.text);
        if text.is_empty() {
            return Err(OcrError::EmptyResult);
        }
        Ok(OcrOutput {
            text,
            confidence: output.confidence.clamp(0.0, 1.0),
        })
    }

    fn parse_file(&self, path: &Path) -> Result<ParsedDocument, ParseError> {
        let fs_meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ParseError::NotFound(path.to_path_buf()),
            _ => ParseError::Io(e),
        })?;
        let size = fs_meta.len();
        if size > MAX_FILE_SIZE {
            return Err(ParseError::TooLarge {
                size,
                max: MAX_FILE_SIZE,
            });
        }

        let bytes = std::fs::read(path)?;
        let format = detect_format_bytes(&bytes);

        let (pages, citation_confidence, ocr_confidence) = match format.category {
            FileCategory::Pdf => self.pdf_pages(&bytes)?,
            FileCategory::Image => {
                let output = self.ocr(&bytes)?;
                let confidence = output.confidence;
                (vec![output.text], confidence, Some(confidence))
            }
            FileCategory::PlainText => {
                let text = String::from_utf8(bytes)
                    .map_err(|e| ParseError::Encoding(e.to_string()))?;
                (vec![sanitize_extracted_text(&text)], PARSED_TEXT_CITATION_CONFIDENCE, None)
            }
            FileCategory::Unsupported => {
                return Err(ParseError::UnsupportedFormat(format.mime_type));
            }
        };

        let text = pages
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        let metadata = DocumentMetadata {
            file_size: size,
            format: format.category.as_str().into(),
            mime_type: Some(format.mime_type),
            created_at: fs_meta.created().ok().map(DateTime::<Utc>::from),
            modified_at: fs_meta.modified().ok().map(DateTime::<Utc>::from),
            title: derive_title(&text),
            ocr_confidence,
        };

        tracing::debug!(
            format = %metadata.format,
            pages = pages.len(),
            chars = text.chars().count(),
            "Document parsed"
        );

        Ok(ParsedDocument {
            citations: build_citations(&pages, citation_confidence),
            pages: pages.len(),
            text,
            metadata,
        })
    }

    /// Text-layer pages, falling back to OCR of the whole file when no
    /// page carries a text layer.
    fn pdf_pages(&self, bytes: &[u8]) -> Result<(Vec<String>, f32, Option<f32>), ParseError> {
        let pages: Vec<String> = self
            .pdf
            .extract_pages(bytes)?
            .iter()
            .map(|p| sanitize_extracted_text(p))
            .collect();

        let layer_chars: usize = pages.iter().map(|p| p.trim().chars().count()).sum();
        if layer_chars >= MIN_TEXT_LAYER_CHARS {
            return Ok((pages, PARSED_TEXT_CITATION_CONFIDENCE, None));
        }

        tracing::info!(pages = pages.len(), "PDF has no text layer, falling back to OCR");
        let output = self.ocr(bytes)?;
        let confidence = output.confidence;
        let mut ocr_pages = vec![output.text];
        // Keep the page count of the source even though OCR text is not split per page.
        ocr_pages.resize(pages.len().max(1), String::new());
        Ok((ocr_pages, confidence, Some(confidence)))
    }
}

/// First non-empty line, capped at `MAX_TITLE_CHARS`.
fn derive_title(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.chars().take(MAX_TITLE_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use crate::pipeline::extraction::ocr::MockOcrEngine;
    use crate::pipeline::extraction::pdf::tests::make_test_pdf;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    #[test]
    fn parses_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "labs.txt",
            b"MEDICAL LABORATORY REPORT\n\nLIPID PANEL\n  LDL Cholesterol: 110 mg/dL (Normal: <100)\n",
        );
        let doc = DocumentProcessor::default()
            .parse(&DocumentSource::File(path))
            .unwrap();

        assert_eq!(doc.pages, 1);
        assert_eq!(
            doc.text,
            "MEDICAL LABORATORY REPORT\nLIPID PANEL\nLDL Cholesterol: 110 mg/dL (Normal: <100)"
        );
        assert_eq!(doc.metadata.format, "plain_text");
        assert_eq!(doc.metadata.title.as_deref(), Some("MEDICAL LABORATORY REPORT"));
        assert!(doc.metadata.file_size > 0);
        assert!(doc.metadata.modified_at.is_some());
        assert_eq!(doc.citations.len(), 1);
        assert_eq!(doc.citations[0].section.as_deref(), Some("LIPID PANEL"));
    }

    #[test]
    fn parses_digital_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = make_test_pdf(&["Glucose 95 mg/dL within range", "Sodium 140 mmol/L within range"]);
        let path = write_file(&dir, "labs.pdf", &pdf);

        let doc = DocumentProcessor::default()
            .parse(&DocumentSource::File(path))
            .unwrap();
        assert_eq!(doc.pages, 2);
        assert_eq!(doc.metadata.format, "pdf");
        assert!(doc.text.contains("Glucose"));
        assert!(doc.citations.iter().any(|c| c.page == Some(2)));
    }

    #[test]
    fn image_goes_through_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "scan.png", &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2]);
        let engine = Arc::new(MockOcrEngine::new("Hemoglobin: 14.2 g/dL (Normal: 12.0-16.0)", 0.72));
        let processor = DocumentProcessor::with_ocr(engine.clone());

        let doc = processor.parse(&DocumentSource::File(path)).unwrap();
        assert_eq!(engine.call_count(), 1);
        assert_eq!(doc.metadata.format, "image");
        assert_eq!(doc.metadata.ocr_confidence, Some(0.72));
        assert_eq!(doc.citations[0].confidence, 0.72);
        assert_eq!(doc.citations[0].source_type, SourceType::Original);
    }

    #[test]
    fn ocr_failure_is_recoverable_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "scan.jpg", &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]);
        let err = DocumentProcessor::default()
            .parse(&DocumentSource::File(path))
            .unwrap_err();
        assert!(matches!(err, ParseError::Ocr(OcrError::EngineUnavailable)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn empty_ocr_text_is_an_ocr_error() {
        let processor = DocumentProcessor::with_ocr(Arc::new(MockOcrEngine::new("  \n\u{200B} ", 0.9)));
        assert_eq!(processor.ocr(b"img"), Err(OcrError::EmptyResult));
    }

    #[test]
    fn manual_text_entry_after_ocr_failure() {
        let source = DocumentSource::Text {
            content: "Hemoglobin: 14.2 g/dL\nWhite Blood Cells: 7.2 K/uL".into(),
            title: Some("Typed from paper copy".into()),
        };
        let doc = DocumentProcessor::default().parse(&source).unwrap();
        assert_eq!(doc.metadata.format, "manual_entry");
        assert_eq!(doc.metadata.title.as_deref(), Some("Typed from paper copy"));
        assert_eq!(doc.pages, 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = DocumentProcessor::default()
            .parse(&DocumentSource::File("/no/such/report.pdf".into()))
            .unwrap_err();
        assert!(matches!(err, ParseError::NotFound(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn unsupported_binary_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "archive.pdf", &[0x50, 0x4B, 0x03, 0x04, 0x00, 0x00]);
        let err = DocumentProcessor::default()
            .parse(&DocumentSource::File(path))
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(_)));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.txt");
        std::fs::File::create(&path)
            .unwrap()
            .set_len(MAX_FILE_SIZE + 1)
            .unwrap();
        let err = DocumentProcessor::default()
            .parse(&DocumentSource::File(path))
            .unwrap_err();
        assert!(matches!(err, ParseError::TooLarge { .. }));
    }

    #[test]
    fn oversized_manual_text_is_rejected() {
        let content = "a".repeat(MAX_FILE_SIZE as usize + 1);
        let err = DocumentProcessor::default()
            .parse(&DocumentSource::text(content))
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::TooLarge { size, max } if size == MAX_FILE_SIZE + 1 && max == MAX_FILE_SIZE
        ));
    }

    #[test]
    fn blank_text_is_empty_document() {
        let err = DocumentProcessor::default()
            .parse(&DocumentSource::text(" \n\t\n"))
            .unwrap_err();
        assert!(matches!(err, ParseError::EmptyDocument));
    }

    #[test]
    fn classify_delegates_to_scorer() {
        let processor = DocumentProcessor::default();
        let c = processor.classify("CHEST X-RAY\nIMPRESSION: no acute findings");
        assert_eq!(c.document_type, crate::models::DocumentType::Radiology);
    }
}
