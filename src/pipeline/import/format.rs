use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{MAX_FILE_SIZE, SUPPORTED_EXTENSIONS};

/// Broad file categories we handle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Pdf,
    Image,
    PlainText,
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::PlainText => "plain_text",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn needs_ocr(&self) -> bool {
        matches!(self, Self::Image)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Result of format detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatDetection {
    pub mime_type: String,
    pub category: FileCategory,
}

/// Number of leading bytes inspected for text detection.
const TEXT_SNIFF_LEN: usize = 8 * 1024;

/// Detect format from magic bytes (NOT file extensions).
pub fn detect_format_bytes(bytes: &[u8]) -> FormatDetection {
    let (mime_type, category) = match bytes {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => ("application/pdf", FileCategory::Pdf),
        // JPEG: starts with FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => ("image/jpeg", FileCategory::Image),
        // PNG: starts with 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => ("image/png", FileCategory::Image),
        // TIFF: little-endian (49 49 2A 00) or big-endian (4D 4D 00 2A)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => {
            ("image/tiff", FileCategory::Image)
        }
        _ if is_likely_text(bytes) => ("text/plain", FileCategory::PlainText),
        _ => ("application/octet-stream", FileCategory::Unsupported),
    };

    FormatDetection {
        mime_type: mime_type.to_string(),
        category,
    }
}

/// Detect format of a file on disk, reading only its first bytes.
pub fn detect_format(path: &Path) -> std::io::Result<FormatDetection> {
    let file = std::fs::File::open(path)?;
    let mut head = Vec::with_capacity(TEXT_SNIFF_LEN);
    file.take(TEXT_SNIFF_LEN as u64).read_to_end(&mut head)?;
    Ok(detect_format_bytes(&head))
}

/// UTF-8 without NUL bytes. A multi-byte sequence cut at the sniff
/// boundary still counts as text.
fn is_likely_text(bytes: &[u8]) -> bool {
    if bytes.is_empty() || bytes.contains(&0) {
        return false;
    }
    let sample = &bytes[..bytes.len().min(TEXT_SNIFF_LEN)];
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && e.valid_up_to() + 4 > sample.len(),
    }
}

/// Lowercase extension of `path`, if any.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Outcome of the cheap pre-check run before `process`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatDetection>,
}

impl FileValidation {
    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            format: None,
        }
    }
}

/// Check existence, size, extension and content signature of a file.
pub fn validate_file(path: &Path) -> FileValidation {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return FileValidation::invalid("File not found"),
    };
    if !metadata.is_file() {
        return FileValidation::invalid("Not a regular file");
    }

    let size = metadata.len();
    if size == 0 {
        return FileValidation::invalid("File is empty");
    }
    if size > MAX_FILE_SIZE {
        return FileValidation::invalid(format!(
            "File too large: {:.1}MB exceeds {}MB limit",
            size as f64 / (1024.0 * 1024.0),
            MAX_FILE_SIZE / (1024 * 1024)
        ));
    }

    match file_extension(path) {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => {}
        Some(ext) => return FileValidation::invalid(format!("Unsupported file extension: .{ext}")),
        None => return FileValidation::invalid("File has no extension"),
    }

    let format = match detect_format(path) {
        Ok(f) => f,
        Err(e) => return FileValidation::invalid(format!("Could not read file: {e}")),
    };
    if !format.category.is_supported() {
        return FileValidation::invalid("Unsupported file content");
    }

    FileValidation {
        valid: true,
        reason: None,
        format: Some(format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn detects_pdf_magic() {
        let d = detect_format_bytes(b"%PDF-1.4\n...");
        assert_eq!(d.category, FileCategory::Pdf);
        assert_eq!(d.mime_type, "application/pdf");
    }

    #[test]
    fn detects_images() {
        assert_eq!(detect_format_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]).category, FileCategory::Image);
        assert_eq!(
            detect_format_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).mime_type,
            "image/png"
        );
        assert_eq!(detect_format_bytes(&[0x49, 0x49, 0x2A, 0x00, 8, 0]).mime_type, "image/tiff");
    }

    #[test]
    fn detects_plain_text() {
        let d = detect_format_bytes("Glucose: 95 mg/dL (Normal: 70-100)".as_bytes());
        assert_eq!(d.category, FileCategory::PlainText);
        assert!(!d.category.needs_ocr());
    }

    #[test]
    fn binary_is_unsupported() {
        let d = detect_format_bytes(&[0x00, 0x01, 0x02, 0x03]);
        assert_eq!(d.category, FileCategory::Unsupported);
        assert!(!d.category.is_supported());
    }

    #[test]
    fn truncated_multibyte_at_boundary_is_still_text() {
        let mut bytes = "a".repeat(TEXT_SNIFF_LEN - 1).into_bytes();
        bytes.push(0xC3); // first byte of 'é'
        assert!(is_likely_text(&bytes));
    }

    #[test]
    fn validate_accepts_text_file() {
        let (_dir, path) = temp_file("report.txt", b"LIPID PANEL\nLDL: 110 mg/dL");
        let v = validate_file(&path);
        assert!(v.valid, "{:?}", v.reason);
        assert_eq!(v.format.unwrap().category, FileCategory::PlainText);
    }

    #[test]
    fn validate_rejects_missing_file() {
        let v = validate_file(Path::new("/definitely/not/here.pdf"));
        assert!(!v.valid);
        assert_eq!(v.reason.as_deref(), Some("File not found"));
    }

    #[test]
    fn validate_rejects_unknown_extension() {
        let (_dir, path) = temp_file("notes.docx", b"hello");
        let v = validate_file(&path);
        assert!(!v.valid);
        assert!(v.reason.unwrap().contains(".docx"));
    }

    #[test]
    fn validate_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        let f = std::fs::File::create(&path).unwrap();
        f.set_len(MAX_FILE_SIZE + 1).unwrap();
        let v = validate_file(&path);
        assert!(!v.valid);
        assert!(v.reason.unwrap().contains("too large"));
    }

    #[test]
    fn validate_rejects_binary_with_text_extension() {
        let (_dir, path) = temp_file("scan.txt", &[0x00, 0xFF, 0x00, 0x10]);
        let v = validate_file(&path);
        assert!(!v.valid);
        assert_eq!(v.reason.as_deref(), Some("Unsupported file content"));
    }

    #[test]
    fn validate_rejects_empty_file() {
        let (_dir, path) = temp_file("empty.pdf", b"");
        assert_eq!(validate_file(&path).reason.as_deref(), Some("File is empty"));
    }
}
