//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::dispatch::{CallMethod, RetryPolicy};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
pub struct ValidatedConfig {
    /// Target URL (required)
    pub url: Url,

    /// HTTP method for the call
    pub method: CallMethod,

    /// Opaque basic auth credentials (optional, never logged)
    pub credentials: Option<String>,

    /// JSON request body, validated but sent verbatim
    pub body: Vec<u8>,

    /// Attempt budget, timeout and backoff for the call
    pub retry_policy: RetryPolicy,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Debug for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedConfig")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("body_len", &self.body.len())
            .field("retry_policy", &self.retry_policy)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ url: {}, method: {}, auth: {}, body: {} bytes, \
             retry: {}x/{}ms timeout/{}ms delay }}",
            self.url,
            self.method,
            if self.credentials.is_some() { "basic" } else { "none" },
            self.body.len(),
            self.retry_policy.max_attempts,
            self.retry_policy.attempt_timeout.as_millis(),
            self.retry_policy.initial_delay.as_millis(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required fields are missing (`url`, body)
    /// - URL is invalid or not http(s)
    /// - Method is neither POST nor PUT
    /// - Body is not valid JSON
    /// - Retry values are out of range
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let url = Self::resolve_url(cli, toml)?;
        let method = Self::resolve_method(cli, toml)?;

        // CLI wins, then TOML
        let credentials = cli
            .user
            .clone()
            .or_else(|| toml.and_then(|t| t.target.credentials.clone()));

        let body = Self::resolve_body(cli)?;
        let retry_policy = Self::build_retry_policy(cli, toml)?;

        Ok(Self {
            url,
            method,
            credentials,
            body,
            retry_policy,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_url(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Url, ConfigError> {
        let url_str = cli
            .url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.target.url.as_deref()))
            .ok_or_else(|| {
                ConfigError::missing(field::URL, "Use --url or set target.url in config file")
            })?;

        let url = Url::parse(url_str).map_err(|e| ConfigError::InvalidUrl {
            url: url_str.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::InvalidUrl {
                url: url_str.to_string(),
                reason: format!("unsupported scheme '{scheme}'"),
            }),
        }
    }

    fn resolve_method(cli: &Cli, toml: Option<&TomlConfig>) -> Result<CallMethod, ConfigError> {
        if let Some(method) = cli.method {
            return Ok(method.into());
        }

        let method_str = toml
            .and_then(|t| t.target.method.as_deref())
            .unwrap_or(defaults::METHOD);

        parse_method(method_str)
    }

    fn resolve_body(cli: &Cli) -> Result<Vec<u8>, ConfigError> {
        // clap rejects --data together with --data-file
        let body = match (&cli.data, &cli.data_file) {
            (Some(data), _) => data.clone().into_bytes(),
            (None, Some(path)) => std::fs::read(path).map_err(|e| ConfigError::BodyRead {
                path: path.clone(),
                source: e,
            })?,
            (None, None) => {
                return Err(ConfigError::missing(
                    field::BODY,
                    "Use --data '<json>' or --data-file <path>",
                ));
            }
        };

        serde_json::from_slice::<serde_json::Value>(&body).map_err(ConfigError::InvalidBody)?;

        Ok(body)
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default
        let max_attempts = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_attempts))
            .unwrap_or(defaults::RETRY_MAX_ATTEMPTS);

        let attempt_timeout_ms = cli
            .attempt_timeout
            .or_else(|| retry.and_then(|r| r.attempt_timeout_ms))
            .unwrap_or(defaults::ATTEMPT_TIMEOUT_MS);

        let initial_delay_ms = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay_ms))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_MS);

        let max_delay_ms = retry
            .and_then(|r| r.max_delay_ms)
            .unwrap_or(defaults::RETRY_MAX_DELAY_MS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if attempt_timeout_ms == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "attempt_timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_delay_ms < initial_delay_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay ({max_delay_ms}ms) must be >= initial_delay ({initial_delay_ms}ms)"
            )));
        }

        Ok(RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_attempt_timeout(Duration::from_millis(attempt_timeout_ms))
            .with_initial_delay(Duration::from_millis(initial_delay_ms))
            .with_max_delay(Duration::from_millis(max_delay_ms))
            .with_multiplier(multiplier))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_method(s: &str) -> Result<CallMethod, ConfigError> {
    match s.to_ascii_uppercase().as_str() {
        "POST" => Ok(CallMethod::Post),
        "PUT" => Ok(CallMethod::Put),
        _ => Err(ConfigError::InvalidMethod(s.to_string())),
    }
}
