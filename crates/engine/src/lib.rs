//! # migrun-engine: Migration execution for migrun
//!
//! Resolves the connection of an invocation, loads or compiles the
//! migrations, builds a database processor and dispatches the requested
//! task to the migration engine.
//!
//! ```no_run
//! use migrun_core::{NullAnnouncer, RunnerContext};
//! use migrun_engine::{ProcessorFactoryRegistry, TaskExecutor};
//! use std::sync::Arc;
//!
//! # async fn run() -> migrun_engine::EngineResult<()> {
//! let context = RunnerContext::new()
//!     .with_database("sqlite")
//!     .with_connection("sqlite://app.db")
//!     .with_migration_directory("migrations")
//!     .with_task("migrate");
//!
//! TaskExecutor::new(
//!     context,
//!     ProcessorFactoryRegistry::with_default_factories(),
//!     Arc::new(NullAnnouncer),
//! )
//! .execute()
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod execution;
pub mod migrations;
pub mod processors;
pub mod sources;

pub use error::{EngineError, EngineResult};
pub use execution::{dispatch, Command, ConnectionResolver, TaskExecutor};
pub use migrations::{
    MigrationDefinition, MigrationEngine, MigrationModule, MigrationRunResult, MigrationRunner,
};
pub use processors::{
    DatabaseType, Processor, ProcessorFactory, ProcessorFactoryRegistry, ProcessorOptions,
};
pub use sources::{Diagnostic, MigrationSource, Severity};
