//! Single-worker dispatch engine for outbound REST calls.
//!
//! This module provides:
//! - Call descriptors with optional callbacks ([`Call`], [`CallMethod`])
//! - The producer/consumer queue ([`CallQueue`])
//! - Attempt classification and retry budget ([`RetryPolicy`], [`RetryPredicate`])
//! - The worker thread and its producer handle ([`Dispatcher`], [`DispatchHandle`])
//! - Terminal outcome delivery ([`CallbackRouter`], [`Outcome`], [`Completion`])
//!
//! # Delivery guarantees
//!
//! Every call passed to [`DispatchHandle::send`] is completed exactly once:
//! either its success sink or its error sink fires, never both. Calls start
//! and complete in submission order, because a single worker performs all
//! network I/O.

mod call;
mod dispatcher;
mod error;
mod queue;
mod retry;
mod router;
mod stats;

#[cfg(test)]
mod retry_tests;
#[cfg(test)]
mod router_tests;

pub use call::{Call, CallMethod};
pub use dispatcher::{DispatchHandle, Dispatcher, WORKER_THREAD_NAME, WorkerState};
pub use error::{DispatchError, ErrorKind, RequestError};
pub use queue::CallQueue;
pub use retry::{RetryPolicy, RetryPredicate, Verdict};
pub use router::{CallbackRouter, Completion, ErrorCallback, Outcome, SuccessCallback};
pub use stats::StatsSnapshot;
