use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{GenerationError, GenerationRequest, LlmClient};

/// Deterministic backend for tests and offline runs.
///
/// Replays a scripted sequence of outcomes; the last one repeats once the
/// script runs out. Counts calls and keeps the prompts it was given.
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    last: Mutex<Result<String, GenerationError>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    /// Always answers with `response`.
    pub fn new(response: &str) -> Self {
        Self::sequence(vec![Ok(response.to_string())])
    }

    /// Always fails with `error`.
    pub fn failing(error: GenerationError) -> Self {
        Self::sequence(vec![Err(error)])
    }

    pub fn sequence(outcomes: Vec<Result<String, GenerationError>>) -> Self {
        let last = outcomes
            .last()
            .cloned()
            .unwrap_or_else(|| Ok(String::new()));
        Self {
            script: Mutex::new(outcomes.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(outcome) => outcome,
            None => self
                .last
                .lock()
                .map(|l| l.clone())
                .unwrap_or_else(|_| Err(GenerationError::TaskFailed("mock poisoned".into()))),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
