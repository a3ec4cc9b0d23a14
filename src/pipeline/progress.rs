//! Per-run progress reporting. Each run owns its reporter; nothing is
//! registered globally, so concurrent runs cannot see each other's events.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{ProcessingStage, ProcessingStatus};

/// Caller-supplied progress sink.
pub type ProgressCallback = Arc<dyn Fn(&ProcessingStatus) + Send + Sync>;

/// Fixed progress checkpoints, in percent.
pub mod checkpoints {
    pub const PARSING: u8 = 10;
    pub const ANALYZING: u8 = 30;
    pub const SUMMARIZING: u8 = 50;
    pub const EXTRACTING: u8 = 70;
    pub const VALIDATING: u8 = 90;
    pub const DONE: u8 = 100;
}

/// New correlation id: `doc_<unix millis>_<random hex>`.
pub fn new_correlation_id() -> String {
    format!(
        "doc_{}_{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

pub struct ProgressReporter {
    correlation_id: String,
    callback: Option<ProgressCallback>,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(correlation_id: String, callback: Option<ProgressCallback>) -> Self {
        Self {
            correlation_id,
            callback,
            started: Instant::now(),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Deliver one status event. A panicking callback is logged and
    /// otherwise ignored.
    pub fn report(&self, stage: ProcessingStage, progress: u8, message: &str) {
        let Some(callback) = &self.callback else {
            return;
        };
        let status = ProcessingStatus {
            correlation_id: self.correlation_id.clone(),
            stage,
            progress,
            message: message.to_string(),
            estimated_time_remaining_ms: self.estimate_remaining(stage, progress),
        };

        if catch_unwind(AssertUnwindSafe(|| callback(&status))).is_err() {
            tracing::warn!(
                correlation_id = %self.correlation_id,
                stage = %stage,
                "Progress callback panicked; continuing"
            );
        }
    }

    /// Linear extrapolation from elapsed time and progress so far.
    fn estimate_remaining(&self, stage: ProcessingStage, progress: u8) -> Option<u64> {
        if stage.is_terminal() || progress == 0 {
            return None;
        }
        let elapsed = self.started.elapsed().as_millis() as u64;
        let remaining = u64::from(100u8.saturating_sub(progress));
        Some(elapsed.saturating_mul(remaining) / u64::from(progress))
    }
}
