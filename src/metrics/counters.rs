use std::sync::atomic::{AtomicU64, Ordering};

use super::types::RequestOutcome;

/// Success and failure tallies for one run.
///
/// Both counts only ever grow. They are shared by `Arc` between the dispatch
/// loop, which writes them, and the progress reporters, which read them.
#[derive(Debug, Default)]
pub struct Counters {
    success: AtomicU64,
    failure: AtomicU64,
}

impl Counters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &RequestOutcome) {
        if outcome.is_success() {
            self.record_success();
        } else {
            self.record_failure();
        }
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failure(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    /// Requests that have completed, in either direction.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.success().saturating_add(self.failure())
    }
}
