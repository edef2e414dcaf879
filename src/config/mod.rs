//! Configuration management for the update monitor.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides

use std::env;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::CONFIG_PATH_ENV;
use crate::constants::DEFAULT_MAX_WAIT_IN_SECS;
use crate::Error;
use crate::Result;

/// Poll loop tuning
///
/// Merged from, lowest priority first:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables prefixed `PROP_MONITOR__`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Server-side bound of each `waitForUpdates` call, in seconds
    #[serde(default = "default_max_wait_in_secs")]
    pub max_wait_in_secs: u64,

    /// Pause after each applied batch, in milliseconds (0 = none)
    #[serde(default)]
    pub update_delay_in_ms: u64,

    /// Ask the service for partial updates when creating the filter
    #[serde(default = "default_partial_updates")]
    pub partial_updates: bool,

    /// Log every received property change at debug level
    #[serde(default)]
    pub debug_updates: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_wait_in_secs: default_max_wait_in_secs(),
            update_delay_in_ms: 0,
            partial_updates: default_partial_updates(),
            debug_updates: false,
        }
    }
}

impl MonitorConfig {
    /// Loads configuration from defaults, the `CONFIG_PATH` file and
    /// environment variables, without validation.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("PROP_MONITOR__MAX_WAIT_IN_SECS", "30");
    /// let cfg = MonitorConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Layers the file at `path` over the current values; environment
    /// variables still win.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(self) -> Result<Self> {
        if self.max_wait_in_secs == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_wait_in_secs must be greater than 0".to_string(),
            )));
        }
        Ok(self)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_in_secs)
    }

    /// `None` when no inter-poll delay is configured
    pub fn update_delay(&self) -> Option<Duration> {
        (self.update_delay_in_ms > 0).then(|| Duration::from_millis(self.update_delay_in_ms))
    }
}

fn environment() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

fn default_max_wait_in_secs() -> u64 {
    DEFAULT_MAX_WAIT_IN_SECS
}
fn default_partial_updates() -> bool {
    true
}
