//! Tests for `CallbackRouter`, `Outcome` and `Completion`.

use super::router::CallbackRouter;
use super::{Completion, ErrorKind, Outcome};
use crate::transport::HttpResponse;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

fn ok_response() -> HttpResponse {
    HttpResponse::new(http::StatusCode::OK, http::HeaderMap::new(), b"done".to_vec())
}

/// Records which callbacks fired, in order.
#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn router(&self) -> CallbackRouter {
        let success = self.clone();
        let error = self.clone();
        CallbackRouter {
            on_success: Some(Box::new(move |r: &HttpResponse| {
                success.push(format!("success:{}", r.status.as_u16()));
            })),
            on_error: Some(Box::new(move |kind: ErrorKind, body: &[u8]| {
                error.push(format!("error:{kind}:{}", String::from_utf8_lossy(body)));
            })),
            completion: None,
        }
    }
}

mod deliver {
    use super::*;

    #[test]
    fn success_fires_only_success_callback() {
        let log = Log::default();
        log.router().deliver(Outcome::Success(ok_response()));

        assert_eq!(log.entries(), vec!["success:200"]);
    }

    #[test]
    fn failure_fires_only_error_callback_with_body() {
        let log = Log::default();
        log.router()
            .deliver(Outcome::failure(ErrorKind::SendFailed, b"last".to_vec()));

        assert_eq!(log.entries(), vec!["error:send_failed:last"]);
    }

    #[test]
    fn missing_callbacks_are_a_no_op() {
        CallbackRouter::default().deliver(Outcome::Success(ok_response()));
        CallbackRouter::default().deliver(Outcome::failure(ErrorKind::Malformed, Vec::new()));
    }

    #[test]
    fn completion_receives_outcome_after_callback() {
        let log = Log::default();
        let (tx, mut rx) = oneshot::channel();
        let mut router = log.router();
        router.completion = Some(tx);

        router.deliver(Outcome::Success(ok_response()));

        assert_eq!(log.entries(), vec!["success:200"]);
        assert_eq!(rx.try_recv().unwrap(), Outcome::Success(ok_response()));
    }

    #[test]
    fn dropped_completion_receiver_is_ignored() {
        let (tx, rx) = oneshot::channel();
        drop(rx);
        let router = CallbackRouter {
            completion: Some(tx),
            ..CallbackRouter::default()
        };

        router.deliver(Outcome::failure(ErrorKind::SendFailed, Vec::new()));
    }

    #[test]
    fn panicking_callback_still_completes() {
        let (tx, mut rx) = oneshot::channel();
        let router = CallbackRouter {
            on_success: Some(Box::new(|_: &HttpResponse| panic!("callback bug"))),
            on_error: None,
            completion: Some(tx),
        };

        router.deliver(Outcome::Success(ok_response()));

        assert!(rx.try_recv().unwrap().is_success());
    }
}

mod outcome {
    use super::*;

    #[test]
    fn accessors_reflect_variant() {
        let success = Outcome::Success(ok_response());
        let failure = Outcome::failure(ErrorKind::SendFailed, b"err".to_vec());

        assert!(success.is_success());
        assert_eq!(success.error_kind(), None);
        assert_eq!(success.body(), b"done");

        assert!(!failure.is_success());
        assert_eq!(failure.error_kind(), Some(ErrorKind::SendFailed));
        assert_eq!(failure.body(), b"err");
    }

    #[test]
    fn error_kind_display_names() {
        assert_eq!(ErrorKind::Malformed.to_string(), "malformed");
        assert_eq!(ErrorKind::SendFailed.to_string(), "send_failed");
        assert_eq!(ErrorKind::Stopped.to_string(), "stopped");
    }
}

mod completion {
    use super::*;

    #[tokio::test]
    async fn wait_resolves_to_sent_outcome() {
        let (tx, rx) = oneshot::channel();
        tx.send(Outcome::Success(ok_response())).unwrap();

        assert!(Completion::new(rx).wait().await.is_success());
    }

    #[tokio::test]
    async fn wait_reports_stopped_when_sender_dropped() {
        let (tx, rx) = oneshot::channel::<Outcome>();
        drop(tx);

        let outcome = Completion::new(rx).wait().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Stopped));
    }

    #[test]
    fn blocking_wait_resolves_from_other_thread() {
        let (tx, rx) = oneshot::channel();
        let sender = std::thread::spawn(move || {
            let _ = tx.send(Outcome::failure(ErrorKind::Malformed, Vec::new()));
        });

        let outcome = Completion::new(rx).blocking_wait();
        sender.join().unwrap();

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Malformed));
    }
}
