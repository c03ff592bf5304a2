//! rest-dispatch: asynchronous REST call dispatcher
//!
//! A library for handing JSON POST/PUT calls to a single background worker
//! that performs them in submission order, retries failed attempts within a
//! bounded budget and reports each call's terminal outcome through
//! callbacks or a completion handle.

pub mod config;
pub mod dispatch;
pub mod time;
pub mod transport;
