//! Processor configuration loaded from `conveyor.toml`.
//!
//! Values absent from the file fall back to sensible defaults. CLI flags
//! applied in [`crate::cli`] take precedence over the file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ProcessorError;

/// Top-level configuration for the processor and the demo store.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Minutes between poll ticks. Must be positive.
    #[serde(default = "default_poll_interval_mins")]
    pub poll_interval_mins: u64,

    /// Upper bound in seconds for simulated per-entity processing.
    /// Must be positive.
    #[serde(default = "default_max_processing_secs")]
    pub max_processing_secs: u64,

    /// Arrival generator settings (demo store only).
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Settings for the in-memory store's arrival generator.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Seconds between generated batches.
    #[serde(default = "default_generator_period_secs")]
    pub period_secs: u64,

    /// Largest batch of entities added in one period.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: u32,

    /// Total batches to generate before the generator goes quiet.
    /// Unlimited when absent.
    #[serde(default)]
    pub max_batches: Option<u32>,
}

fn default_poll_interval_mins() -> u64 {
    1
}

fn default_max_processing_secs() -> u64 {
    600
}

fn default_generator_period_secs() -> u64 {
    30
}

fn default_max_batch_size() -> u32 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_mins: default_poll_interval_mins(),
            max_processing_secs: default_max_processing_secs(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            period_secs: default_generator_period_secs(),
            max_batch_size: default_max_batch_size(),
            max_batches: None,
        }
    }
}

impl Config {
    /// Load the configuration from `conveyor.toml` in the current
    /// directory. Uses defaults if the file does not exist.
    pub fn load() -> Result<Self, ProcessorError> {
        Self::load_from(Path::new("conveyor.toml"))
    }

    /// Load the configuration from an explicit path, falling back to
    /// defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ProcessorError> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&contents)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// The poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_mins * 60)
    }

    fn validate(&self) -> Result<(), ProcessorError> {
        if self.poll_interval_mins == 0 {
            return Err(ProcessorError::Config(
                "poll_interval_mins must be positive".into(),
            ));
        }
        if self.max_processing_secs == 0 {
            return Err(ProcessorError::Config(
                "max_processing_secs must be positive".into(),
            ));
        }
        if self.generator.period_secs == 0 {
            return Err(ProcessorError::Config(
                "generator.period_secs must be positive".into(),
            ));
        }
        if self.generator.max_batch_size == 0 {
            return Err(ProcessorError::Config(
                "generator.max_batch_size must be positive".into(),
            ));
        }
        Ok(())
    }
}
