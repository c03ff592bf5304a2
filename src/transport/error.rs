//! Error types for HTTP transport operations.

use thiserror::Error;

/// Error type for a single transport round trip.
///
/// Describes what went wrong without dictating recovery strategy.
/// The dispatcher treats every variant as a failed attempt.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the per-attempt timeout.
    #[error("Request timed out")]
    Timeout,

    /// The transport rejected the URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
