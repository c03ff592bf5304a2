//! Dispatcher counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Calls passed to `send`, including rejected ones.
    pub submitted: u64,
    /// Calls rejected because the dispatcher had stopped.
    pub rejected: u64,
    /// Calls completed with a success outcome.
    pub succeeded: u64,
    /// Calls completed with a failure outcome by the worker.
    pub failed: u64,
    /// Transport attempts made across all calls.
    pub attempts: u64,
}

impl StatsSnapshot {
    /// Returns the number of calls the worker has completed.
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

#[derive(Debug, Default)]
pub(crate) struct Stats {
    submitted: AtomicU64,
    rejected: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    attempts: AtomicU64,
}

impl Stats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, success: bool) {
        let counter = if success {
            &self.succeeded
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
        }
    }
}
