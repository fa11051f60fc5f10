//! Upstream call accounting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Tallies upstream API call attempts for end-of-run reporting. Shared via
/// `Arc` between the client and whoever reports the stats; increments are
/// relaxed since the counts are purely informational.
#[derive(Debug, Default)]
pub struct CallCounter {
    total: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time snapshot of a [`CallCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
}

impl CallCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> CallStats {
        CallStats {
            total: self.total.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.success.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}
