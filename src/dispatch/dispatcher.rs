//! The dispatcher: a single worker thread draining the call queue.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

use tokio::runtime::Runtime;
use tokio::sync::oneshot;

use crate::time::{Sleeper, TokioSleeper};
use crate::transport::{HttpClient, HttpError, HttpRequest, HttpResponse};

use super::stats::{Stats, StatsSnapshot};
use super::{
    Call, CallQueue, Completion, DispatchError, ErrorKind, Outcome, RetryPolicy, RetryPredicate,
    Verdict,
};

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "rest-dispatch-worker";

/// Lifecycle state of the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Idle, blocked on the empty queue.
    Waiting = 0,
    /// A call was popped and its request is being built.
    Processing = 1,
    /// A transport attempt is in flight.
    Attempting = 2,
    /// The terminal outcome is being delivered.
    Completing = 3,
    /// The worker has exited.
    Shutdown = 4,
}

impl WorkerState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Waiting,
            1 => Self::Processing,
            2 => Self::Attempting,
            3 => Self::Completing,
            _ => Self::Shutdown,
        }
    }
}

/// State shared between producers and the worker.
#[derive(Debug)]
struct Shared {
    queue: CallQueue<Call>,
    stats: Stats,
    state: AtomicU8,
}

impl Shared {
    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Producer-side handle to a running [`Dispatcher`].
///
/// Cheap to clone and safe to use from any thread. Handles outliving the
/// dispatcher keep working: submissions are then rejected with
/// [`ErrorKind::Stopped`].
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    shared: Arc<Shared>,
}

impl DispatchHandle {
    /// Enqueues a call and returns immediately.
    ///
    /// If the dispatcher has stopped, the call's error callback receives
    /// [`ErrorKind::Stopped`] on the current thread.
    pub fn send(&self, call: Call) {
        self.shared.stats.record_submitted();
        if let Err(call) = self.shared.queue.push(call) {
            tracing::warn!("Dispatcher stopped; rejecting {} {}", call.method(), call.url());
            self.shared.stats.record_rejected();
            let (_, router) = call.into_parts();
            router.deliver(Outcome::failure(ErrorKind::Stopped, Vec::new()));
        }
    }

    /// Enqueues a call and returns a handle resolving to its outcome.
    ///
    /// Callbacks registered on the call still run before the handle resolves.
    pub fn submit(&self, mut call: Call) -> Completion {
        let (sender, receiver) = oneshot::channel();
        call.attach_completion(sender);
        self.send(call);
        Completion::new(receiver)
    }

    /// Returns a snapshot of the dispatcher counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Returns the worker's current state.
    #[must_use]
    pub fn worker_state(&self) -> WorkerState {
        WorkerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Returns the number of calls waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// Returns true once the dispatcher stopped accepting calls.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.queue.is_closed()
    }
}

/// Owner of the worker thread.
///
/// [`start`](Self::start) spawns the worker; [`stop`](Self::stop) (or
/// dropping the dispatcher) closes the queue, lets the worker drain the
/// calls already queued, and joins it. The transport and its runtime are
/// released when the worker exits.
///
/// # Example
///
/// ```no_run
/// use rest_dispatch::dispatch::{Call, Dispatcher, RetryPolicy};
/// use rest_dispatch::transport::ReqwestClient;
///
/// # fn main() -> Result<(), rest_dispatch::dispatch::DispatchError> {
/// let dispatcher = Dispatcher::start(ReqwestClient::new(), RetryPolicy::default())?;
/// let handle = dispatcher.handle();
///
/// std::thread::spawn(move || {
///     handle.send(Call::post("https://api.example.com/events", b"{}".to_vec()));
/// });
///
/// dispatcher.stop()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Dispatcher {
    handle: DispatchHandle,
    worker: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Starts a dispatcher using [`TokioSleeper`] between retries.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the runtime or thread cannot be created.
    pub fn start<C>(client: C, policy: RetryPolicy) -> Result<Self, DispatchError>
    where
        C: HttpClient + 'static,
    {
        Self::start_with_sleeper(client, policy, TokioSleeper)
    }

    /// Starts a dispatcher with a custom sleeper for retry delays.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the runtime or thread cannot be created.
    pub fn start_with_sleeper<C, S>(
        client: C,
        policy: RetryPolicy,
        sleeper: S,
    ) -> Result<Self, DispatchError>
    where
        C: HttpClient + 'static,
        S: Sleeper + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(DispatchError::Runtime)?;

        let shared = Arc::new(Shared {
            queue: CallQueue::new(),
            stats: Stats::default(),
            state: AtomicU8::new(WorkerState::Waiting as u8),
        });

        tracing::info!(
            "Starting dispatcher (max_attempts: {}, attempt_timeout: {}ms)",
            policy.max_attempts,
            policy.attempt_timeout.as_millis()
        );

        let worker = Worker {
            client,
            sleeper,
            policy,
            shared: Arc::clone(&shared),
        };

        let join = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run(&runtime))
            .map_err(DispatchError::Spawn)?;

        Ok(Self {
            handle: DispatchHandle { shared },
            worker: Some(join),
        })
    }

    /// Returns a new producer handle.
    #[must_use]
    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    /// Enqueues a call (see [`DispatchHandle::send`]).
    pub fn send(&self, call: Call) {
        self.handle.send(call);
    }

    /// Enqueues a call and returns its completion (see [`DispatchHandle::submit`]).
    pub fn submit(&self, call: Call) -> Completion {
        self.handle.submit(call)
    }

    /// Stops accepting calls, drains the queue and joins the worker.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::WorkerPanicked`] if the worker thread panicked.
    pub fn stop(mut self) -> Result<(), DispatchError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), DispatchError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        tracing::debug!(
            "Stopping dispatcher ({} call(s) still queued)",
            self.handle.pending()
        );
        self.handle.shared.queue.close();

        worker.join().map_err(|_| DispatchError::WorkerPanicked)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!("{e}");
        }
    }
}

/// The worker side: owns the transport and drives each call to completion.
struct Worker<C, S> {
    client: C,
    sleeper: S,
    policy: RetryPolicy,
    shared: Arc<Shared>,
}

impl<C: HttpClient, S: Sleeper> Worker<C, S> {
    fn run(self, runtime: &Runtime) {
        tracing::debug!("Dispatch worker started");
        let _guard = DrainOnExit(&self.shared);

        // Shutdown is only observed here, between calls
        while let Some(call) = self.shared.queue.pop_blocking() {
            self.process(runtime, call);
            self.shared.set_state(WorkerState::Waiting);
        }

        tracing::debug!("Dispatch worker stopped");
    }

    fn process(&self, runtime: &Runtime, call: Call) {
        self.shared.set_state(WorkerState::Processing);

        let request = call.build_request();
        let (predicate, router) = call.into_parts();

        let outcome = match request {
            Ok(request) => catch_unwind(AssertUnwindSafe(|| {
                runtime.block_on(self.attempt(&request, predicate.as_ref()))
            }))
            .unwrap_or_else(|_| {
                tracing::error!(
                    "{} {} panicked during an attempt",
                    request.method,
                    request.url
                );
                Outcome::failure(ErrorKind::SendFailed, Vec::new())
            }),
            Err(e) => {
                tracing::warn!("Malformed call: {e}");
                Outcome::failure(ErrorKind::Malformed, Vec::new())
            }
        };

        self.shared.set_state(WorkerState::Completing);
        self.shared.stats.record_outcome(outcome.is_success());
        router.deliver(outcome);
    }

    /// Runs the attempt loop for one request.
    async fn attempt(&self, request: &HttpRequest, predicate: Option<&RetryPredicate>) -> Outcome {
        let mut last_body = Vec::new();

        for attempt in 1..=self.policy.max_attempts {
            self.shared.set_state(WorkerState::Attempting);
            self.shared.stats.record_attempt();

            let result = self.perform(request).await;
            log_attempt(request, attempt, &result);

            match (self.policy.verdict(&result, predicate), result) {
                (Verdict::Accept, Ok(response)) => return Outcome::Success(response),
                // `verdict` only accepts attempts that produced a response
                (Verdict::Accept, Err(e)) => unreachable!("accepted transport error: {e}"),
                (Verdict::Retry, result) => {
                    last_body = body_of(result);
                    if self.policy.should_retry(attempt) {
                        let delay = self.policy.delay_for_retry(attempt - 1);
                        self.sleeper.sleep(delay).await;
                    }
                }
                (Verdict::Reject, result) => {
                    tracing::warn!(
                        "{} {} rejected on attempt {attempt}",
                        request.method,
                        request.url
                    );
                    return Outcome::failure(ErrorKind::SendFailed, body_of(result));
                }
            }
        }

        tracing::warn!(
            "{} {} failed after {} attempt(s)",
            request.method,
            request.url,
            self.policy.max_attempts
        );
        Outcome::failure(ErrorKind::SendFailed, last_body)
    }

    /// Performs one transport call bounded by the attempt timeout.
    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        tokio::time::timeout(
            self.policy.attempt_timeout,
            self.client.request(request.clone()),
        )
        .await
        .unwrap_or(Err(HttpError::Timeout))
    }
}

/// Closes the queue when the worker exits and fails whatever is left.
///
/// On a normal exit the queue is already closed and empty.
struct DrainOnExit<'a>(&'a Shared);

impl Drop for DrainOnExit<'_> {
    fn drop(&mut self) {
        let shared = self.0;
        shared.queue.close();

        while let Some(call) = shared.queue.try_pop() {
            tracing::warn!("Worker exiting; failing {} {}", call.method(), call.url());
            shared.stats.record_outcome(false);
            let (_, router) = call.into_parts();
            router.deliver(Outcome::failure(ErrorKind::Stopped, Vec::new()));
        }

        shared.set_state(WorkerState::Shutdown);
    }
}

fn body_of(result: Result<HttpResponse, HttpError>) -> Vec<u8> {
    result.map(|response| response.body).unwrap_or_default()
}

fn log_attempt(request: &HttpRequest, attempt: u32, result: &Result<HttpResponse, HttpError>) {
    match result {
        Ok(response) => tracing::debug!(
            "{} {} attempt {attempt}: {} ({} bytes)",
            request.method,
            request.url,
            response.status,
            response.body.len()
        ),
        Err(e) => tracing::debug!("{} {} attempt {attempt}: {e}", request.method, request.url),
    }
}
