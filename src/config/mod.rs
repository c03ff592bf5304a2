//! Configuration layer for the `rest-dispatch` binary.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! `url` has no default and must come from the CLI or the `[target]` section.
//! The request body is CLI-only: exactly one of `--data` or `--data-file`.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Some retry policy options are TOML-only (not available via CLI):
//! - `retry.max_delay_ms` (default: 30000) - Maximum retry delay
//! - `retry.multiplier` (default: 2.0) - Exponential backoff multiplier

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod toml_tests;

pub use cli::{Cli, Command, MethodArg};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
