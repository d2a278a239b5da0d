//! Error types for the migration engine and its orchestration
//!
//! Configuration, discovery, compilation and engine-construction errors are
//! raised while initializing, strictly before any migration runs. Processor
//! and migration errors come out of the engine operation itself.

use migrun_core::ConfigError;
use thiserror::Error;

use crate::sources::Diagnostic;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Error types for the migration engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Connection string or dialect could not be resolved
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Migration sources or module could not be located
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Migration sources failed to compile
    #[error("Error compiling migrations:\n{}", format_diagnostics(.diagnostics))]
    Compilation { diagnostics: Vec<Diagnostic> },

    /// No processor factory is registered for the dialect
    #[error("Unknown database type '{dialect}'. Available database types: {}", .available.join(", "))]
    EngineConstruction {
        dialect: String,
        available: Vec<String>,
    },

    /// Task name does not map to any migration command
    #[error("Unknown task '{0}'. Expected one of: migrate, migrate:up, migrate:down, rollback, rollback:toversion, rollback:all")]
    UnknownCommand(String),

    /// Database processor failure
    #[error("Processor error: {0}")]
    Processor(String),

    /// Migration could not be applied or reverted
    #[error("Migration error: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Errors raised before any engine operation started
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration(_)
                | EngineError::Discovery(_)
                | EngineError::Compilation { .. }
                | EngineError::EngineConstruction { .. }
        )
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Configuration(err.to_string())
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Processor(err.to_string())
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
