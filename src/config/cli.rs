//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::dispatch::CallMethod;

/// rest-dispatch: send one JSON call through the retrying dispatcher
///
/// Enqueues a POST or PUT call, waits for its terminal outcome and prints
/// the response body.
#[derive(Debug, Parser)]
#[command(name = "rest-dispatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Target URL (required for run mode)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// HTTP method for the call
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Basic auth credentials in 'user:password' format
    #[arg(long, value_name = "USER:PASSWORD")]
    pub user: Option<String>,

    /// Inline JSON request body
    #[arg(long, conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Path to a file holding the JSON request body
    #[arg(long = "data-file")]
    pub data_file: Option<PathBuf>,

    /// Maximum number of attempts per call
    #[arg(long = "retry-max")]
    pub retry_max: Option<u32>,

    /// Per-attempt timeout in milliseconds
    #[arg(long = "attempt-timeout", value_name = "MS")]
    pub attempt_timeout: Option<u64>,

    /// Initial retry delay in milliseconds
    #[arg(long = "retry-delay", value_name = "MS")]
    pub retry_delay: Option<u64>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for rest-dispatch
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "rest-dispatch.toml")]
        output: PathBuf,
    },
}

/// HTTP method argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Create a resource
    #[value(name = "post", alias = "POST")]
    Post,
    /// Replace a resource
    #[value(name = "put", alias = "PUT")]
    Put,
}

impl From<MethodArg> for CallMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Post => Self::Post,
            MethodArg::Put => Self::Put,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
