//! Configuration management for ratecheck.
//!
//! Application settings come from an optional YAML file overlaid with
//! `RATECHECK__*` environment variables (e.g. `RATECHECK__LOGGING__LEVEL`).
//! Rate limit rules live in their own policy file, see
//! [`PolicySet`](crate::ratelimit::PolicySet).

use clap::ValueEnum;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{RatecheckError, Result};

/// Main configuration for the ratecheck tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatecheckConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Policy file location
    #[serde(default)]
    pub policy: PolicyFileConfig,

    /// Watch mode configuration
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Policy file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyFileConfig {
    /// Path to the rate limit policy YAML; built-in rules when unset
    pub path: Option<String>,
}

/// Watch mode configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between snapshot evaluations
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    5
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl RatecheckConfig {
    /// Load configuration from an optional file path plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }
        let settings = builder
            .add_source(Environment::with_prefix("RATECHECK").separator("__"))
            .build()?;

        let config: RatecheckConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string, without environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;

        let config: RatecheckConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.watch.interval_secs == 0 {
            return Err(RatecheckError::Config(
                "watch.interval_secs must be greater than 0".into(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(RatecheckError::Config("logging.level cannot be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RatecheckConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.policy.path, None);
        assert_eq!(config.watch.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
logging:
  level: debug
  format: json
policy:
  path: /etc/ratecheck/policy.yaml
watch:
  interval_secs: 30
"#;
        let config = RatecheckConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.policy.path.as_deref(), Some("/etc/ratecheck/policy.yaml"));
        assert_eq!(config.watch.interval_secs, 30);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = RatecheckConfig::from_yaml("logging:\n  level: warn\n").unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.watch.interval_secs, 5);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = RatecheckConfig::from_yaml("watch:\n  interval_secs: 0\n");
        assert!(matches!(result, Err(RatecheckError::Config(_))));
    }

    // Environment variables are process-wide, so every `load` scenario
    // lives in this one test.
    #[test]
    fn test_load_applies_environment_overrides() {
        std::env::set_var("RATECHECK__WATCH__INTERVAL_SECS", "30");
        std::env::set_var("RATECHECK__LOGGING__LEVEL", "debug");

        let from_env = RatecheckConfig::load(None);

        let path = std::env::temp_dir().join(format!("ratecheck-config-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "logging:\n  level: warn\n  format: json\nwatch:\n  interval_secs: 10\npolicy:\n  path: rules.yaml\n",
        )
        .unwrap();
        let from_file = RatecheckConfig::load(Some(&path));

        std::env::remove_var("RATECHECK__WATCH__INTERVAL_SECS");
        std::env::remove_var("RATECHECK__LOGGING__LEVEL");
        let file_only = RatecheckConfig::load(Some(&path));
        std::fs::remove_file(&path).unwrap();

        let from_env = from_env.unwrap();
        assert_eq!(from_env.logging.level, "debug");
        assert_eq!(from_env.watch.interval_secs, 30);
        assert_eq!(from_env.logging.format, LogFormat::Text);

        // Environment wins over the file; untouched file values survive.
        let from_file = from_file.unwrap();
        assert_eq!(from_file.logging.level, "debug");
        assert_eq!(from_file.watch.interval_secs, 30);
        assert_eq!(from_file.logging.format, LogFormat::Json);
        assert_eq!(from_file.policy.path.as_deref(), Some("rules.yaml"));

        let file_only = file_only.unwrap();
        assert_eq!(file_only.logging.level, "warn");
        assert_eq!(file_only.watch.interval_secs, 10);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = RatecheckConfig::from_yaml("logging:\n  format: xml\n");
        assert!(matches!(result, Err(RatecheckError::Config(_))));
    }
}
