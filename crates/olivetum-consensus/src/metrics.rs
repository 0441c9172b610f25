//! Process-local consensus counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracking noteworthy verifier and controller events.
#[derive(Debug, Default)]
pub struct ConsensusMetrics {
    timestamp_too_close: AtomicU64,
    difficulty_clamp: AtomicU64,
}

impl ConsensusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_timestamp_too_close(&self) {
        self.timestamp_too_close.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_difficulty_clamp(&self) {
        self.difficulty_clamp.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timestamp_too_close(&self) -> u64 {
        self.timestamp_too_close.load(Ordering::Relaxed)
    }

    pub fn difficulty_clamp(&self) -> u64 {
        self.difficulty_clamp.load(Ordering::Relaxed)
    }
}
