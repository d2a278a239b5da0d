//! Log output of the migrun binary
//!
//! Logs go to stderr so they never mix with announcements on stdout.

use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration for the CLI
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for migrun targets (e.g. "info", "debug")
    pub level: String,
    pub format: LogFormat,
    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Configuration for a CLI invocation
    pub fn for_cli(verbose: bool, format: LogFormat) -> Self {
        Self {
            level: if verbose { "debug" } else { "info" }.to_string(),
            format,
            include_location: verbose,
        }
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn directive(&self) -> String {
        format!("migrun={},sqlx=warn", self.level)
    }
}

/// Install the global subscriber; `RUST_LOG` takes precedence over the config
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.directive()))?;

    let layer = Layer::new()
        .with_writer(io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()?,
    }

    tracing::debug!(
        target: "migrun::logging",
        level = %config.level,
        format = ?config.format,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_enables_debug() {
        let config = LoggingConfig::for_cli(true, LogFormat::Text);
        assert_eq!(config.directive(), "migrun=debug,sqlx=warn");
        assert!(config.include_location);
    }

    #[test]
    fn test_default_directive() {
        let config = LoggingConfig::for_cli(false, LogFormat::Json);
        assert_eq!(config.directive(), "migrun=info,sqlx=warn");
    }

    #[test]
    fn test_default_config_logs_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.directive(), "migrun=info,sqlx=warn");
        assert!(!config.include_location);
    }
}
