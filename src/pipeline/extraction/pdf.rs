use super::types::PdfExtractor;
use super::ParseError;

/// PDF text-layer extractor backed by lopdf.
/// Handles digital PDFs; scanned pages come back empty.
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ParseError> {
        let doc = lopdf::Document::load_mem(pdf_bytes).map_err(|e| ParseError::Pdf(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(ParseError::EncryptedPdf);
        }

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(ParseError::Pdf("document has no pages".into()));
        }

        let texts = pages
            .keys()
            .map(|&number| {
                doc.extract_text(&[number]).unwrap_or_else(|e| {
                    tracing::debug!(page = number, error = %e, "No text layer on page");
                    String::new()
                })
            })
            .collect();

        Ok(texts)
    }
}
