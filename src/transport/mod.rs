//! Transport layer for performing single HTTP calls.
//!
//! This module provides:
//! - Request/response value types ([`HttpRequest`], [`HttpResponse`])
//! - The transport abstraction used by the dispatcher ([`HttpClient`])
//! - Production transport implementation ([`ReqwestClient`])
//!
//! The transport performs exactly one round trip per call. Retries, timeouts
//! and completion delivery belong to [`crate::dispatch`].

mod client;
mod error;
mod http;


pub use client::ReqwestClient;
pub use error::HttpError;
pub use http::{HttpClient, HttpRequest, HttpResponse};
