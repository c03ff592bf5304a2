//! Error types for the dispatch engine.

use std::fmt;

use thiserror::Error;

/// Classification of a terminal failure, surfaced to `on_error`.
///
/// Transient failures (non-2xx status, empty body, transport error) are
/// internal retry signals and never appear here individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The call could not be built into a valid request.
    ///
    /// No transport attempt was made.
    Malformed,

    /// No attempt produced an accepted outcome within the retry budget.
    SendFailed,

    /// The call was submitted after the dispatcher stopped accepting work.
    Stopped,
}

impl ErrorKind {
    /// Returns a stable lowercase name for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::SendFailed => "send_failed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error building a transport request from a [`Call`](super::Call).
///
/// Any of these classifies the call as [`ErrorKind::Malformed`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The target URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL string
        url: String,
        /// Parser error message
        reason: String,
    },

    /// The target URL does not use HTTP or HTTPS.
    #[error("Unsupported URL scheme '{0}': expected http or https")]
    UnsupportedScheme(String),
}

/// Error type for dispatcher lifecycle operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The worker's async runtime could not be created.
    #[error("Failed to build dispatcher runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The worker thread could not be spawned.
    #[error("Failed to spawn dispatcher worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker thread panicked before it could be joined.
    #[error("Dispatcher worker thread panicked")]
    WorkerPanicked,
}
