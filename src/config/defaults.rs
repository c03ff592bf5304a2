//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default HTTP method.
pub const METHOD: &str = "POST";

/// Default maximum number of attempts per call.
pub const RETRY_MAX_ATTEMPTS: u32 = 5;

/// Default per-attempt timeout in milliseconds.
pub const ATTEMPT_TIMEOUT_MS: u64 = 1000;

/// Default delay before the first retry in milliseconds (0 = retry immediately).
pub const RETRY_INITIAL_DELAY_MS: u64 = 0;

/// Default maximum retry delay in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Default per-attempt timeout as Duration.
#[must_use]
pub const fn attempt_timeout() -> Duration {
    Duration::from_millis(ATTEMPT_TIMEOUT_MS)
}

/// Default maximum retry delay as Duration.
#[must_use]
pub const fn retry_max_delay() -> Duration {
    Duration::from_millis(RETRY_MAX_DELAY_MS)
}
