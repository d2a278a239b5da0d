use std::path::PathBuf;

use super::context::RunnerContext;
use super::sources::{ConnectionResolution, ConnectionSource};
use super::validation::{ConfigError, ConfigValidator, MaxValidator, RequiredValidator};

/// Statement timeout applied when none was requested
pub const DEFAULT_TIMEOUT_SECS: u32 = 30;

/// Largest timeout whose millisecond value fits a 32-bit session setting
pub const MAX_TIMEOUT_SECS: u32 = i32::MAX as u32 / 1000;

/// Configuration of one invocation after connection resolution.
///
/// Built once by [`ResolvedConfig::finalize`] and read-only afterwards.
/// `dialect` and `connection_string` are guaranteed non-empty.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub dialect: String,
    pub connection_string: String,
    pub connection_name: Option<String>,
    pub source: ConnectionSource,
    pub target: Option<String>,
    pub module_path: Option<PathBuf>,
    pub migration_directory: Option<PathBuf>,
    pub namespace: Option<String>,
    pub task: Option<String>,
    pub version: i64,
    pub steps: u32,
    pub working_directory: PathBuf,
    pub profile: Option<String>,
    pub timeout: u32,
    pub preview_only: bool,
    pub output: Option<PathBuf>,
    pub allow_unknown_task: bool,
}

impl ResolvedConfig {
    /// Combine the invocation context with the connection resolution.
    ///
    /// `known_dialects` only feeds the error hint.
    pub fn finalize(
        ctx: &RunnerContext,
        resolution: ConnectionResolution,
        known_dialects: &[String],
    ) -> Result<Self, ConfigError> {
        RequiredValidator::new(
            "connection",
            "Connection String or Name is required (--connection)",
        )
        .validate(&resolution.connection_string)?;

        RequiredValidator::new(
            "database",
            format!(
                "Database type is required (--db). Available database types: {}",
                known_dialects.join(", ")
            ),
        )
        .validate(&resolution.dialect)?;

        MaxValidator {
            field: "timeout",
            max: MAX_TIMEOUT_SECS,
        }
        .validate(&ctx.timeout)?;

        let ConnectionResolution {
            dialect,
            connection_name,
            connection_string,
            source,
        } = resolution;

        Ok(Self {
            dialect: dialect.unwrap_or_default(),
            connection_string: connection_string.unwrap_or_default(),
            connection_name,
            source,
            target: ctx.target.clone(),
            module_path: ctx.module_path(),
            migration_directory: ctx.migration_directory_path(),
            namespace: ctx.namespace.clone().filter(|n| !n.is_empty()),
            task: ctx.task.clone(),
            version: ctx.version,
            steps: ctx.steps,
            working_directory: ctx.base_directory(),
            profile: ctx.profile.clone().filter(|p| !p.is_empty()),
            timeout: normalize_timeout(ctx.timeout),
            preview_only: ctx.preview_only,
            output: ctx.output.clone(),
            allow_unknown_task: ctx.allow_unknown_task,
        })
    }
}

fn normalize_timeout(timeout: u32) -> u32 {
    if timeout == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        timeout
    }
}
