use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::StrategyError;

/// Primary (generative) narrative strategy. Implementations may block;
/// the resolver bounds every call with a timeout.
pub trait NarrativeGenerator: Send + Sync {
    /// Model name recorded on generated narratives.
    fn model(&self) -> &str;

    fn generate(&self, system: &str, prompt: &str) -> Result<String, StrategyError>;
}

/// Mock generator for testing: returns a fixed response and counts calls.
pub struct MockGenerator {
    response: String,
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NarrativeGenerator for MockGenerator {
    fn model(&self) -> &str {
        "mock"
    }

    fn generate(&self, _system: &str, _prompt: &str) -> Result<String, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Always fails with `StrategyError::Unavailable`.
pub struct FailingGenerator;

impl NarrativeGenerator for FailingGenerator {
    fn model(&self) -> &str {
        "failing"
    }

    fn generate(&self, _system: &str, _prompt: &str) -> Result<String, StrategyError> {
        Err(StrategyError::Unavailable("simulated failure".into()))
    }
}

/// Sleeps before answering, to exercise the resolver timeout.
pub struct SlowGenerator {
    delay: Duration,
}

impl SlowGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl NarrativeGenerator for SlowGenerator {
    fn model(&self) -> &str {
        "slow"
    }

    fn generate(&self, _system: &str, _prompt: &str) -> Result<String, StrategyError> {
        std::thread::sleep(self.delay);
        Ok("late narrative".into())
    }
}
