//! Application execution logic.
//!
//! Starts a dispatcher, hands it the configured call, waits for the
//! terminal outcome and shuts the worker down.

use thiserror::Error;

use rest_dispatch::config::ValidatedConfig;
use rest_dispatch::dispatch::{Call, DispatchError, Dispatcher, ErrorKind, Outcome};
use rest_dispatch::transport::{HttpClient, HttpResponse, ReqwestClient};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The dispatcher could not be started.
    #[error("Failed to start dispatcher: {0}")]
    Startup(#[source] DispatchError),

    /// The call ended without an accepted response.
    #[error("Call failed ({kind}){}", describe_body(.body))]
    Delivery {
        /// Terminal error kind
        kind: ErrorKind,
        /// Body of the last response, if any
        body: Vec<u8>,
    },

    /// The worker did not shut down cleanly.
    #[error("Failed to stop dispatcher: {0}")]
    Shutdown(#[source] DispatchError),
}

fn describe_body(body: &[u8]) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", String::from_utf8_lossy(body))
    }
}

/// Executes the configured call with the production HTTP client.
///
/// # Errors
///
/// See [`execute_with`].
#[cfg(not(tarpaulin_include))]
pub fn execute(config: ValidatedConfig) -> Result<HttpResponse, RunError> {
    execute_with(ReqwestClient::new(), config)
}

/// Executes the configured call over the given transport.
///
/// Blocks until the call reaches its terminal outcome, then stops the
/// dispatcher before returning.
///
/// # Errors
///
/// Returns an error if:
/// - The worker thread or its runtime cannot be created
/// - The call ends as `Malformed`, `SendFailed` or `Stopped`
/// - The worker panicked during shutdown
pub fn execute_with<C>(client: C, config: ValidatedConfig) -> Result<HttpResponse, RunError>
where
    C: HttpClient + 'static,
{
    let dispatcher =
        Dispatcher::start(client, config.retry_policy.clone()).map_err(RunError::Startup)?;
    let handle = dispatcher.handle();

    let outcome = dispatcher.submit(build_call(config)).blocking_wait();
    dispatcher.stop().map_err(RunError::Shutdown)?;

    let stats = handle.stats();
    tracing::debug!(
        "Dispatcher finished: {} attempt(s), {} succeeded, {} failed",
        stats.attempts,
        stats.succeeded,
        stats.failed
    );

    match outcome {
        Outcome::Success(response) => {
            tracing::info!(
                "Call accepted with status {} ({} bytes)",
                response.status,
                response.body.len()
            );
            Ok(response)
        }
        Outcome::Failure { kind, body } => Err(RunError::Delivery { kind, body }),
    }
}

/// Builds the dispatched call from configuration.
fn build_call(config: ValidatedConfig) -> Call {
    let call = Call::new(config.method, config.url.as_str(), config.body);

    match config.credentials {
        Some(credentials) => call.with_credentials(credentials),
        None => call,
    }
}
