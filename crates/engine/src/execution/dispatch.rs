//! Task dispatch
//!
//! Maps a task name onto exactly one [`MigrationEngine`] operation.

use crate::error::{EngineError, EngineResult};
use crate::migrations::{MigrationEngine, MigrationRunResult};

/// Engine operation selected by a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MigrateUp,
    MigrateUpTo(i64),
    MigrateDown(i64),
    Rollback(u32),
    RollbackToVersion(i64),
}

impl Command {
    /// Parse a task name. Names are case-sensitive.
    ///
    /// Unknown tasks are an error unless `allow_unknown` is set, in which
    /// case they select no command.
    pub fn parse(
        task: Option<&str>,
        version: i64,
        steps: u32,
        allow_unknown: bool,
    ) -> EngineResult<Option<Command>> {
        let command = match task.unwrap_or_default() {
            "" | "migrate" | "migrate:up" => {
                if version != 0 {
                    Command::MigrateUpTo(version)
                } else {
                    Command::MigrateUp
                }
            }
            "rollback" => Command::Rollback(if steps == 0 { 1 } else { steps }),
            "rollback:toversion" => Command::RollbackToVersion(version),
            "rollback:all" => Command::RollbackToVersion(0),
            "migrate:down" => Command::MigrateDown(version),
            unknown if allow_unknown => {
                tracing::warn!(task = unknown, "Unknown task, nothing to do");
                return Ok(None);
            }
            unknown => return Err(EngineError::UnknownCommand(unknown.to_string())),
        };
        Ok(Some(command))
    }
}

/// Invoke the engine operation for `command`
pub async fn dispatch(
    engine: &mut dyn MigrationEngine,
    command: &Command,
) -> EngineResult<MigrationRunResult> {
    match *command {
        Command::MigrateUp => engine.migrate_up().await,
        Command::MigrateUpTo(version) => engine.migrate_up_to(version).await,
        Command::MigrateDown(version) => engine.migrate_down(version).await,
        Command::Rollback(steps) => engine.rollback(steps).await,
        Command::RollbackToVersion(version) => engine.rollback_to_version(version).await,
    }
}
