//! Sleep abstraction for testability.
//!
//! This module provides a [`Sleeper`] trait used between retry attempts,
//! allowing tests to skip real delays while production code uses tokio's
//! timer.

use std::time::Duration;

/// Abstraction over asynchronous sleeping.
///
/// # Example
///
/// ```
/// use rest_dispatch::time::{InstantSleeper, Sleeper};
/// use std::time::Duration;
///
/// # async fn example() {
/// InstantSleeper.sleep(Duration::from_secs(60)).await; // returns immediately
/// # }
/// ```
pub trait Sleeper: Send + Sync {
    /// Waits for the given duration.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Production sleeper backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Sleeper that returns immediately, for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
