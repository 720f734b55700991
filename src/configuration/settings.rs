use crate::configuration::constants::common::{
    DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_SLOW_TESTS, DEFAULT_TIMEOUT, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load run configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("Configuration file '{}' does not exist", .0.display())]
    Missing(PathBuf),
    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Options recognized by a run. Unset fields take the documented defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Per-attempt deadline of a test body, 30s unless overridden per test.
    #[serde(
        alias = "timeout_ms",
        deserialize_with = "crate::configuration::deserialize::duration::deserialize"
    )]
    pub timeout: Duration,
    /// Extra attempts after the first failure, 2 unless overridden per test.
    pub retries: u32,
    /// Run every selected test concurrently instead of suite by suite.
    pub parallel: bool,
    /// Stop running a suite's remaining tests once anything in the run failed.
    /// Sequential mode only.
    pub bail: bool,
    /// Log each result and the final summary at `info`.
    pub verbose: bool,
    /// Pause between two attempts of the same test.
    #[serde(deserialize_with = "crate::configuration::deserialize::duration::deserialize")]
    pub retry_delay: Duration,
    /// How many entries the slow test ranking keeps.
    pub slow_tests: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            parallel: false,
            bail: false,
            verbose: true,
            retry_delay: DEFAULT_RETRY_DELAY,
            slow_tests: DEFAULT_SLOW_TESTS,
        }
    }
}

impl RunConfig {
    /// Reads the configuration from an optional YAML/TOML/JSON file, then lets
    /// `CRUCIBLE_*` environment variables override individual keys.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            if !path.exists() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        let config: RunConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == Duration::from_millis(0) {
            return Err(ConfigError::Invalid {
                field: "timeout",
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{ConfigError, RunConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    fn write_temp(extension: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "crucible-{}.{}",
            uuid::Uuid::new_v4().simple(),
            extension
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();

        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.retries, 2);
        assert!(!config.parallel);
        assert!(!config.bail);
        assert!(config.verbose);
        assert_eq!(config.slow_tests, 5);
    }

    #[test]
    fn test_load_yaml_with_unit_strings() {
        let path = write_temp(
            "yaml",
            "timeout: 250ms\nretries: 0\nparallel: true\nretry_delay: 10ms\n",
        );
        let config = RunConfig::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.retries, 0);
        assert!(config.parallel);
        assert!(config.verbose);
        assert_eq!(config.retry_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_load_json_with_timeout_in_millis() {
        let path = write_temp("json", r#"{ "timeout_ms": 1500, "bail": true }"#);
        let config = RunConfig::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert!(config.bail);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let path = std::env::temp_dir().join("crucible-does-not-exist.toml");
        let result = RunConfig::load(Some(path.as_path()));

        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = RunConfig {
            timeout: Duration::from_millis(0),
            ..RunConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "timeout", .. })
        ));
    }
}
