//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Call target configuration
    #[serde(default)]
    pub target: TargetSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,
}

/// Call target configuration section.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    /// Target URL
    pub url: Option<String>,

    /// HTTP method: "POST" or "PUT" (default: POST)
    pub method: Option<String>,

    /// Basic auth credentials, `user:password`
    pub credentials: Option<String>,
}

impl std::fmt::Debug for TargetSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSection")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of attempts
    pub max_attempts: Option<u32>,

    /// Per-attempt timeout in milliseconds
    pub attempt_timeout_ms: Option<u64>,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# rest-dispatch Configuration File

[target]
# Target URL (required, can be overridden by --url)
# url = "https://api.example.com/events"

# HTTP method: "POST" or "PUT" (default: POST)
# method = "POST"

# Basic auth credentials as "user:password" (can be overridden by --user)
# credentials = "user:secret"

[retry]
# Maximum number of attempts per call (default: 5)
# max_attempts = 5

# Upper bound on a single attempt in milliseconds (default: 1000)
# attempt_timeout_ms = 1000

# Delay before the first retry in milliseconds; 0 retries immediately (default: 0)
# initial_delay_ms = 0

# Maximum retry delay in milliseconds (default: 30000)
# max_delay_ms = 30000

# Backoff multiplier (default: 2.0)
# multiplier = 2.0
"#
    .to_string()
}
