use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{OcrEngine, OcrOutput};
use super::OcrError;

/// Placeholder engine used when no OCR backend is wired in.
/// Every call fails with a recoverable `EngineUnavailable`.
pub struct UnavailableOcr;

impl OcrEngine for UnavailableOcr {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<OcrOutput, OcrError> {
        Err(OcrError::EngineUnavailable)
    }
}

/// Mock OCR engine for testing: returns configured text and confidence.
pub struct MockOcrEngine {
    result: Result<OcrOutput, OcrError>,
    calls: AtomicUsize,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            result: Ok(OcrOutput {
                text: text.to_string(),
                confidence,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: OcrError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<OcrOutput, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_engine_fails_recoverably() {
        assert_eq!(UnavailableOcr.recognize(b"img"), Err(OcrError::EngineUnavailable));
    }

    #[test]
    fn mock_engine_returns_configured_text() {
        let engine = MockOcrEngine::new("Hemoglobin 14.2 g/dL", 0.87);
        let out = engine.recognize(&[0xFF, 0xD8, 0xFF]).unwrap();
        assert_eq!(out.text, "Hemoglobin 14.2 g/dL");
        assert_eq!(out.confidence, 0.87);
        assert_eq!(engine.call_count(), 1);
    }
}
