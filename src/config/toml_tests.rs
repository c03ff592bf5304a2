//! Tests for TOML configuration parsing.

use super::toml::{TomlConfig, default_config_template};

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [target]
            url = "https://example.com/events"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        assert_eq!(
            config.target.url.as_deref(),
            Some("https://example.com/events")
        );
        assert!(config.target.method.is_none());
    }

    #[test]
    fn parse_full_target_section() {
        let toml = r#"
            [target]
            url = "https://api.example.com/items"
            method = "PUT"
            credentials = "alice:s3cret"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let target = &config.target;

        assert_eq!(target.url.as_deref(), Some("https://api.example.com/items"));
        assert_eq!(target.method.as_deref(), Some("PUT"));
        assert_eq!(target.credentials.as_deref(), Some("alice:s3cret"));
    }

    #[test]
    fn parse_retry_section() {
        let toml = r"
            [retry]
            max_attempts = 3
            attempt_timeout_ms = 500
            initial_delay_ms = 100
            max_delay_ms = 2000
            multiplier = 1.5
        ";

        let config = TomlConfig::parse(toml).unwrap();
        let retry = &config.retry;

        assert_eq!(retry.max_attempts, Some(3));
        assert_eq!(retry.attempt_timeout_ms, Some(500));
        assert_eq!(retry.initial_delay_ms, Some(100));
        assert_eq!(retry.max_delay_ms, Some(2000));
        assert_eq!(retry.multiplier, Some(1.5));
    }

    #[test]
    fn parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.target.url.is_none());
        assert!(config.target.credentials.is_none());
        assert!(config.retry.max_attempts.is_none());
    }

    #[test]
    fn reject_unknown_fields() {
        let toml = r#"
            [target]
            url = "https://example.com"
            headers = "not supported"
        "#;

        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn reject_unknown_sections() {
        let toml = r#"
            [headers]
            url = "https://example.com"
        "#;

        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn debug_redacts_credentials() {
        let toml = r#"
            [target]
            credentials = "alice:s3cret"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }
}

mod default_template {
    use super::*;

    #[test]
    fn template_is_valid_toml() {
        let template = default_config_template();
        let result = TomlConfig::parse(&template);
        assert!(
            result.is_ok(),
            "Template should be valid TOML: {:?}",
            result.err()
        );
    }

    #[test]
    fn template_contains_all_sections() {
        let template = default_config_template();

        assert!(template.contains("[target]"));
        assert!(template.contains("[retry]"));
    }

    #[test]
    fn template_documents_every_key() {
        let template = default_config_template();

        for key in [
            "url",
            "method",
            "credentials",
            "max_attempts",
            "attempt_timeout_ms",
            "initial_delay_ms",
            "max_delay_ms",
            "multiplier",
        ] {
            assert!(template.contains(key), "Template should document {key}");
        }
    }
}

mod file_loading {
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn load_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [target]
            url = "https://example.com"
        "#
        )
        .unwrap();

        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.target.url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let path = Path::new("nonexistent_config_file_12345.toml");
        let result = TomlConfig::load(path);

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn load_invalid_toml_file_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let result = TomlConfig::load(file.path());

        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }
}
