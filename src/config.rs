//! Executor configuration.
//!
//! [`ReadOptions`] is the isolation level and timeout pair every relaxed read
//! runs with. It is handed to the executor at construction and never changes
//! afterwards. Applications can load it from the `[read]` section of
//! `config/config.toml` or from `DYNAQUERY__READ__*` environment variables
//! using [`ReadOptions::load()`].

use crate::transaction::IsolationLevel;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "DYNAQUERY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReadOptions {
    #[serde(default = "default_isolation_level")]
    pub isolation_level: IsolationLevel,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_isolation_level() -> IsolationLevel {
    IsolationLevel::ReadUncommitted
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            isolation_level: default_isolation_level(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ReadOptions {
    pub fn new(isolation_level: IsolationLevel, timeout: Duration) -> Self {
        Self {
            isolation_level,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load the read options from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        Self::from_config(&settings)
    }

    /// Read the `[read]` section of `settings`; a missing section means defaults.
    pub fn from_config(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<ReadOptions>("read") {
            Ok(options) => Ok(options),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Read options could not be loaded from file or environment: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReadOptions::default();
        assert_eq!(options.isolation_level, IsolationLevel::ReadUncommitted);
        assert_eq!(options.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let settings = Config::builder().build().unwrap();
        assert_eq!(ReadOptions::from_config(&settings).unwrap(), ReadOptions::default());
    }

    #[test]
    fn test_section_overrides() {
        let settings = Config::builder()
            .set_override("read.isolation_level", "repeatable_read")
            .unwrap()
            .set_override("read.timeout_ms", 9_000)
            .unwrap()
            .build()
            .unwrap();
        let options = ReadOptions::from_config(&settings).unwrap();
        assert_eq!(options.isolation_level, IsolationLevel::RepeatableRead);
        assert_eq!(options.timeout_ms, 9_000);
    }

    #[test]
    fn test_partial_section_keeps_other_default() {
        let settings = Config::builder()
            .set_override("read.timeout_ms", 2_000)
            .unwrap()
            .build()
            .unwrap();
        let options = ReadOptions::from_config(&settings).unwrap();
        assert_eq!(options.isolation_level, IsolationLevel::ReadUncommitted);
        assert_eq!(options.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_sub_second_timeout_is_kept() {
        let options = ReadOptions::new(IsolationLevel::ReadCommitted, Duration::from_millis(500));
        assert_eq!(options.timeout_ms, 500);
        assert_eq!(options.timeout(), Duration::from_millis(500));
    }
}
