//! Retry policy: attempt budget, timeouts, backoff and attempt classification.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use http::StatusCode;

use crate::transport::{HttpError, HttpResponse};

/// Decision taken after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Consume another attempt from the budget.
    Retry,
    /// Deliver the attempt's response as a success.
    Accept,
    /// Stop immediately and deliver a failure.
    Reject,
}

/// Caller-supplied override of the default failure classification.
///
/// Consulted only for attempts the default rules consider failed. It
/// receives the status code (`None` when the transport produced no
/// response) and the response body, and returns `true` if the attempt is
/// a real error that should be retried. Returning `false` declares the
/// outcome acceptable.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use rest_dispatch::dispatch::RetryPredicate;
///
/// // A 404 means "already deleted"; anything else is worth retrying.
/// let predicate = RetryPredicate::new(|status, _body| status != Some(StatusCode::NOT_FOUND));
///
/// assert!(!predicate.should_retry(Some(StatusCode::NOT_FOUND), b"gone"));
/// assert!(predicate.should_retry(Some(StatusCode::BAD_GATEWAY), b""));
/// ```
pub struct RetryPredicate(Box<dyn Fn(Option<StatusCode>, &[u8]) -> bool + Send>);

impl RetryPredicate {
    /// Wraps a predicate closure.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(Option<StatusCode>, &[u8]) -> bool + Send + 'static,
    {
        Self(Box::new(predicate))
    }

    /// Evaluates the predicate.
    ///
    /// A panicking predicate is logged and treated as `true` (retry).
    #[must_use]
    pub fn should_retry(&self, status: Option<StatusCode>, body: &[u8]) -> bool {
        catch_unwind(AssertUnwindSafe(|| (self.0)(status, body))).unwrap_or_else(|_| {
            tracing::error!("Retry predicate panicked; treating attempt as retryable");
            true
        })
    }
}

impl std::fmt::Debug for RetryPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RetryPredicate(..)")
    }
}

/// Configuration for the per-call attempt loop.
///
/// # Defaults
///
/// - `max_attempts`: 5
/// - `attempt_timeout`: 1 second
/// - `initial_delay`: zero (retry immediately)
/// - `max_delay`: 30 seconds
/// - `multiplier`: 2.0
///
/// # Example
///
/// ```
/// use rest_dispatch::dispatch::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(3)
///     .with_attempt_timeout(Duration::from_secs(2))
///     .with_initial_delay(Duration::from_millis(100));
///
/// assert_eq!(policy.delay_for_retry(1), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,

    /// Upper bound on a single transport call.
    pub attempt_timeout: Duration,

    /// Delay before the first retry; zero disables backoff.
    pub initial_delay: Duration,

    /// Cap applied to computed delays.
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Default maximum attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Default per-attempt timeout (1 second).
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

    /// Default initial delay (none).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::ZERO;

    /// Default maximum delay (30 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Minimum value for `max_attempts`.
    pub const MIN_MAX_ATTEMPTS: u32 = 1;

    /// Creates a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: Self::DEFAULT_ATTEMPT_TIMEOUT,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }

    /// Sets the maximum number of attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is less than 1.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(
            max_attempts >= Self::MIN_MAX_ATTEMPTS,
            "max_attempts must be at least 1"
        );
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the per-attempt timeout.
    ///
    /// # Panics
    ///
    /// Panics if `timeout` is zero.
    #[must_use]
    pub const fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "attempt_timeout must be non-zero");
        self.attempt_timeout = timeout;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is not positive (must be > 0.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "multiplier must be positive");
        self.multiplier = multiplier;
        self
    }

    /// Computes the delay for a given retry number (0-indexed), capped at `max_delay`.
    ///
    /// Never panics: fields set directly can bypass the builder checks, so a
    /// non-finite delay is capped at `max_delay` and a negative one is zero.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        // Retry counts are bounded by max_attempts, far below i32::MAX in practice
        #[allow(clippy::cast_possible_wrap)]
        let multiplier = self.multiplier.powi(retry as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        if delay_secs.is_nan() {
            return self.max_delay;
        }
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(Duration::ZERO)
    }

    /// Returns true if another attempt may follow attempt number `attempt` (1-based).
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Default failure rule: transport error, empty body, or status >= 400.
    #[must_use]
    pub fn is_failed_attempt(result: &Result<HttpResponse, HttpError>) -> bool {
        match result {
            Err(_) => true,
            Ok(response) => response.body.is_empty() || response.status.as_u16() >= 400,
        }
    }

    /// Classifies the result of one attempt.
    ///
    /// - Not failed: [`Verdict::Accept`].
    /// - Failed, no predicate, or predicate says retry: [`Verdict::Retry`].
    /// - Failed, predicate says not an error: [`Verdict::Accept`] if a
    ///   response exists, [`Verdict::Reject`] after a transport error.
    ///
    /// The attempt budget is enforced by the caller via [`Self::should_retry`].
    #[must_use]
    pub fn verdict(
        &self,
        result: &Result<HttpResponse, HttpError>,
        predicate: Option<&RetryPredicate>,
    ) -> Verdict {
        if !Self::is_failed_attempt(result) {
            return Verdict::Accept;
        }

        let Some(predicate) = predicate else {
            return Verdict::Retry;
        };

        let (status, body) = match result {
            Ok(response) => (Some(response.status), response.body.as_slice()),
            Err(_) => (None, &[][..]),
        };

        if predicate.should_retry(status, body) {
            Verdict::Retry
        } else if result.is_ok() {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
