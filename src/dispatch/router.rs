//! Terminal outcome delivery.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::oneshot;

use crate::transport::HttpResponse;

use super::ErrorKind;

/// Callback invoked with the accepted response.
pub type SuccessCallback = Box<dyn FnOnce(&HttpResponse) + Send>;

/// Callback invoked with the failure kind and the best-effort response body.
pub type ErrorCallback = Box<dyn FnOnce(ErrorKind, &[u8]) + Send>;

/// Terminal result of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An attempt was accepted.
    Success(HttpResponse),
    /// The call ended without an accepted attempt.
    Failure {
        /// Why the call failed
        kind: ErrorKind,
        /// Body of the last response, empty if there was none
        body: Vec<u8>,
    },
}

impl Outcome {
    /// Creates a failure outcome.
    #[must_use]
    pub const fn failure(kind: ErrorKind, body: Vec<u8>) -> Self {
        Self::Failure { kind, body }
    }

    /// Returns true for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the failure kind, if any.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Returns the response body (success) or best-effort body (failure).
    #[must_use]
    pub fn body(&self) -> &[u8] {
        match self {
            Self::Success(response) => &response.body,
            Self::Failure { body, .. } => body,
        }
    }
}

/// Delivers a call's terminal outcome to its optional sinks.
///
/// Delivery consumes the router, so each call is completed at most once.
/// The matching callback runs first, then the outcome is sent to the
/// completion channel if one was attached by
/// [`DispatchHandle::submit`](super::DispatchHandle::submit). Absent sinks
/// are skipped.
///
/// Callbacks run synchronously on the worker thread: a slow callback delays
/// every call queued behind it.
#[derive(Default)]
pub struct CallbackRouter {
    pub(crate) on_success: Option<SuccessCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) completion: Option<oneshot::Sender<Outcome>>,
}

impl CallbackRouter {
    /// Delivers `outcome` to the registered sinks.
    ///
    /// A panicking callback is logged; the completion channel still
    /// receives the outcome.
    pub fn deliver(self, outcome: Outcome) {
        let Self {
            on_success,
            on_error,
            completion,
        } = self;

        let delivered = match &outcome {
            Outcome::Success(response) => {
                on_success.map(|cb| catch_unwind(AssertUnwindSafe(|| cb(response))))
            }
            Outcome::Failure { kind, body } => {
                on_error.map(|cb| catch_unwind(AssertUnwindSafe(|| cb(*kind, body.as_slice()))))
            }
        };

        match delivered {
            Some(Err(_)) => tracing::error!("Completion callback panicked"),
            None if completion.is_none() => {
                if let Outcome::Failure { kind, .. } = &outcome {
                    tracing::debug!("Dropping {kind} failure: no error callback registered");
                }
            }
            _ => {}
        }

        if let Some(sender) = completion {
            // The submitter may have stopped waiting
            let _ = sender.send(outcome);
        }
    }
}

impl std::fmt::Debug for CallbackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRouter")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("completion", &self.completion.is_some())
            .finish()
    }
}

/// Handle resolving to a submitted call's [`Outcome`].
///
/// Returned by [`DispatchHandle::submit`](super::DispatchHandle::submit).
#[derive(Debug)]
pub struct Completion {
    receiver: oneshot::Receiver<Outcome>,
}

impl Completion {
    pub(crate) const fn new(receiver: oneshot::Receiver<Outcome>) -> Self {
        Self { receiver }
    }

    /// Waits asynchronously for the outcome.
    ///
    /// Resolves to an [`ErrorKind::Stopped`] failure if the worker went away
    /// without completing the call.
    pub async fn wait(self) -> Outcome {
        self.receiver
            .await
            .unwrap_or_else(|_| Outcome::failure(ErrorKind::Stopped, Vec::new()))
    }

    /// Blocks the current thread until the outcome is available.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    #[must_use]
    pub fn blocking_wait(self) -> Outcome {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Outcome::failure(ErrorKind::Stopped, Vec::new()))
    }
}
