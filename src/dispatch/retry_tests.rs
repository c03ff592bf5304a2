//! Tests for `RetryPolicy` and attempt classification.

use super::{RetryPolicy, RetryPredicate, Verdict};
use crate::transport::{HttpError, HttpResponse};
use http::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn response(status: u16, body: &[u8]) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(
        StatusCode::from_u16(status).unwrap(),
        http::HeaderMap::new(),
        body.to_vec(),
    ))
}

fn transport_error() -> Result<HttpResponse, HttpError> {
    Err(HttpError::Timeout)
}

mod retry_policy_defaults {
    use super::*;

    #[test]
    fn new_creates_policy_with_defaults() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(1));
        assert_eq!(policy.initial_delay, Duration::ZERO);
        assert_eq!(policy.max_delay, RetryPolicy::DEFAULT_MAX_DELAY);
        assert!((policy.multiplier - RetryPolicy::DEFAULT_MULTIPLIER).abs() < f64::EPSILON);
    }

    #[test]
    fn default_trait_matches_new() {
        assert_eq!(RetryPolicy::new(), RetryPolicy::default());
    }
}

mod retry_policy_builder {
    use super::*;

    #[test]
    fn builder_chains_correctly() {
        let policy = RetryPolicy::new()
            .with_max_attempts(10)
            .with_attempt_timeout(Duration::from_millis(250))
            .with_initial_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(30))
            .with_multiplier(3.0);

        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.attempt_timeout, Duration::from_millis(250));
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!((policy.multiplier - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    #[should_panic(expected = "max_attempts must be at least 1")]
    fn with_max_attempts_zero_panics() {
        let _ = RetryPolicy::new().with_max_attempts(0);
    }

    #[test]
    #[should_panic(expected = "attempt_timeout must be non-zero")]
    fn with_zero_attempt_timeout_panics() {
        let _ = RetryPolicy::new().with_attempt_timeout(Duration::ZERO);
    }

    #[test]
    #[should_panic(expected = "multiplier must be positive")]
    fn with_multiplier_negative_panics() {
        let _ = RetryPolicy::new().with_multiplier(-1.0);
    }
}

mod delay_for_retry {
    use super::*;

    #[test]
    fn zero_initial_delay_never_waits() {
        let policy = RetryPolicy::new();
        for retry in 0..5 {
            assert_eq!(policy.delay_for_retry(retry), Duration::ZERO);
        }
    }

    #[test]
    fn grows_exponentially() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_secs(1))
            .with_multiplier(2.0);

        assert_eq!(policy.delay_for_retry(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(4));
    }

    #[test]
    fn is_capped_at_max_delay() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_secs(10))
            .with_max_delay(Duration::from_secs(15));

        assert_eq!(policy.delay_for_retry(3), Duration::from_secs(15));
    }

    #[test]
    fn negative_multiplier_set_directly_yields_zero_not_panic() {
        let policy = RetryPolicy {
            multiplier: -1.0,
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(1));
        assert_eq!(policy.delay_for_retry(1), Duration::ZERO);
    }

    #[test]
    fn non_finite_multiplier_set_directly_is_capped() {
        let infinite = RetryPolicy {
            multiplier: f64::INFINITY,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_secs(2),
            ..RetryPolicy::default()
        };
        let nan = RetryPolicy {
            multiplier: f64::NAN,
            ..infinite.clone()
        };

        assert_eq!(infinite.delay_for_retry(3), Duration::from_secs(2));
        assert_eq!(nan.delay_for_retry(3), Duration::from_secs(2));
    }
}

mod should_retry {
    use super::*;

    #[test]
    fn allows_attempts_below_budget() {
        let policy = RetryPolicy::new().with_max_attempts(3);

        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn single_attempt_budget_never_retries() {
        assert!(!RetryPolicy::new().with_max_attempts(1).should_retry(1));
    }
}

mod failure_rule {
    use super::*;

    #[test]
    fn success_with_body_is_not_failed() {
        assert!(!RetryPolicy::is_failed_attempt(&response(200, b"{}")));
        assert!(!RetryPolicy::is_failed_attempt(&response(302, b"moved")));
    }

    #[test]
    fn transport_error_is_failed() {
        assert!(RetryPolicy::is_failed_attempt(&transport_error()));
    }

    #[test]
    fn empty_body_is_failed_even_for_2xx() {
        assert!(RetryPolicy::is_failed_attempt(&response(200, b"")));
        assert!(RetryPolicy::is_failed_attempt(&response(204, b"")));
    }

    #[test]
    fn status_400_and_above_is_failed() {
        assert!(RetryPolicy::is_failed_attempt(&response(400, b"bad")));
        assert!(RetryPolicy::is_failed_attempt(&response(404, b"missing")));
        assert!(RetryPolicy::is_failed_attempt(&response(503, b"busy")));
        assert!(!RetryPolicy::is_failed_attempt(&response(399, b"odd")));
    }
}

mod verdict {
    use super::*;

    #[test]
    fn accepts_successful_attempt_without_consulting_predicate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let predicate = RetryPredicate::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        let verdict = RetryPolicy::new().verdict(&response(201, b"{}"), Some(&predicate));

        assert_eq!(verdict, Verdict::Accept);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn retries_failed_attempt_without_predicate() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.verdict(&response(500, b"oops"), None), Verdict::Retry);
        assert_eq!(policy.verdict(&response(200, b""), None), Verdict::Retry);
        assert_eq!(policy.verdict(&transport_error(), None), Verdict::Retry);
    }

    #[test]
    fn retries_when_predicate_returns_true() {
        let predicate = RetryPredicate::new(|_, _| true);

        assert_eq!(
            RetryPolicy::new().verdict(&response(503, b"busy"), Some(&predicate)),
            Verdict::Retry
        );
    }

    #[test]
    fn accepts_response_when_predicate_returns_false() {
        let predicate = RetryPredicate::new(|status, _| status != Some(StatusCode::CONFLICT));

        assert_eq!(
            RetryPolicy::new().verdict(&response(409, b"exists"), Some(&predicate)),
            Verdict::Accept
        );
    }

    #[test]
    fn rejects_transport_error_when_predicate_returns_false() {
        let predicate = RetryPredicate::new(|_, _| false);

        assert_eq!(
            RetryPolicy::new().verdict(&transport_error(), Some(&predicate)),
            Verdict::Reject
        );
    }

    #[test]
    fn predicate_receives_status_and_body() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let capture = Arc::clone(&seen);
        let predicate = RetryPredicate::new(move |status, body| {
            *capture.lock().unwrap() = Some((status, body.to_vec()));
            true
        });

        let _ = RetryPolicy::new().verdict(&response(502, b"gateway"), Some(&predicate));

        assert_eq!(
            *seen.lock().unwrap(),
            Some((Some(StatusCode::BAD_GATEWAY), b"gateway".to_vec()))
        );
    }

    #[test]
    fn predicate_receives_no_status_for_transport_error() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let capture = Arc::clone(&seen);
        let predicate = RetryPredicate::new(move |status, body| {
            *capture.lock().unwrap() = Some((status, body.len()));
            true
        });

        let _ = RetryPolicy::new().verdict(&transport_error(), Some(&predicate));

        assert_eq!(*seen.lock().unwrap(), Some((None, 0)));
    }

    #[test]
    fn panicking_predicate_counts_as_retry() {
        let predicate = RetryPredicate::new(|_, _| panic!("predicate bug"));

        assert_eq!(
            RetryPolicy::new().verdict(&response(500, b"x"), Some(&predicate)),
            Verdict::Retry
        );
    }
}
