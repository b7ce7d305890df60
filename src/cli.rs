//! Command-line interface for the demo binary, based on clap.
//!
//! Flags mirror the configuration surface and override values loaded
//! from `conveyor.toml`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Polls an entity store and processes submitted entities through a
/// throttled worker pool.
#[derive(Debug, Parser)]
#[command(name = "conveyor", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "conveyor.toml")]
    pub config: PathBuf,

    /// Minutes between poll ticks.
    #[arg(long)]
    pub poll_interval_mins: Option<u64>,

    /// Maximum seconds of simulated processing per entity.
    #[arg(long)]
    pub max_processing_secs: Option<u64>,

    /// Seconds between generated arrival batches.
    #[arg(long)]
    pub generator_period_secs: Option<u64>,

    /// Largest batch of generated entities per period.
    #[arg(long)]
    pub max_batch_size: Option<u32>,

    /// Total batches the arrival generator may add before going quiet.
    #[arg(long)]
    pub max_batches: Option<u32>,
}

impl Cli {
    /// Apply CLI overrides on top of the loaded configuration.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(mins) = self.poll_interval_mins {
            config.poll_interval_mins = mins;
        }
        if let Some(secs) = self.max_processing_secs {
            config.max_processing_secs = secs;
        }
        if let Some(secs) = self.generator_period_secs {
            config.generator.period_secs = secs;
        }
        if let Some(size) = self.max_batch_size {
            config.generator.max_batch_size = size;
        }
        if let Some(cap) = self.max_batches {
            config.generator.max_batches = Some(cap);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::parse_from([
            "conveyor",
            "--poll-interval-mins",
            "2",
            "--max-processing-secs",
            "30",
            "--max-batches",
            "5",
        ]);
        assert_eq!(cli.poll_interval_mins, Some(2));
        assert_eq!(cli.max_processing_secs, Some(30));
        assert_eq!(cli.max_batches, Some(5));
        assert!(cli.max_batch_size.is_none());
    }

    #[test]
    fn apply_overrides_config() {
        let cli = Cli::parse_from(["conveyor", "--poll-interval-mins", "3", "--max-batch-size", "7"]);
        let config = cli.apply(Config::default());
        assert_eq!(config.poll_interval_mins, 3);
        assert_eq!(config.generator.max_batch_size, 7);
        // Untouched values keep their defaults.
        assert_eq!(config.max_processing_secs, 600);
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
