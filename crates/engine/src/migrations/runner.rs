//! Migration Runner - Executes migrations through a processor
//!
//! Handles applying migrations, tracking applied versions and running
//! profile migrations. Reverting lives in `rollback.rs`.

use async_trait::async_trait;
use migrun_core::{Announcer, ResolvedConfig};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use super::definitions::{
    MigrationDefinition, MigrationDirection, MigrationModule, MigrationRunResult,
};
use super::version_table::VersionTable;
use crate::error::{EngineError, EngineResult};
use crate::processors::Processor;

/// Operations the command dispatcher can invoke
#[async_trait]
pub trait MigrationEngine: Send {
    /// Apply every pending migration, then the configured profile
    async fn migrate_up(&mut self) -> EngineResult<MigrationRunResult>;

    /// Apply pending migrations up to and including `version`
    async fn migrate_up_to(&mut self, version: i64) -> EngineResult<MigrationRunResult>;

    /// Revert applied migrations above `version`
    async fn migrate_down(&mut self, version: i64) -> EngineResult<MigrationRunResult>;

    /// Revert the `steps` most recently applied migrations
    async fn rollback(&mut self, steps: u32) -> EngineResult<MigrationRunResult>;

    /// Revert applied migrations above `version`; 0 reverts everything
    async fn rollback_to_version(&mut self, version: i64) -> EngineResult<MigrationRunResult>;

    /// Release engine resources
    async fn close(&mut self) -> EngineResult<()> {
        Ok(())
    }
}

/// Migration runner that executes migrations against a processor
pub struct MigrationRunner {
    pub(super) module: MigrationModule,
    pub(super) namespace: Option<String>,
    profile: Option<String>,
    pub(super) processor: Box<dyn Processor>,
    pub(super) announcer: Arc<dyn Announcer>,
    pub(super) version_table: VersionTable,
    table_ready: bool,
}

impl MigrationRunner {
    /// Create a new migration runner
    pub fn new(
        module: MigrationModule,
        config: &ResolvedConfig,
        processor: Box<dyn Processor>,
        announcer: Arc<dyn Announcer>,
    ) -> Self {
        Self {
            module,
            namespace: config.namespace.clone(),
            profile: config.profile.clone(),
            processor,
            announcer,
            version_table: VersionTable::default(),
            table_ready: false,
        }
    }

    /// Versions currently recorded as applied
    pub async fn applied_versions(&mut self) -> EngineResult<BTreeSet<i64>> {
        self.ensure_version_table().await?;
        let sql = self.version_table.applied_versions_sql();
        let versions = self.processor.fetch_versions(&sql).await?;
        Ok(versions.into_iter().collect())
    }

    /// Ensure the version table exists
    async fn ensure_version_table(&mut self) -> EngineResult<()> {
        if self.table_ready {
            return Ok(());
        }
        let sql = self.version_table.create_table_sql();
        self.processor.execute(&sql).await?;
        self.table_ready = true;
        Ok(())
    }

    /// Apply pending versions accepted by `filter`, ascending
    async fn apply_pending<F>(&mut self, filter: F) -> EngineResult<MigrationRunResult>
    where
        F: Fn(i64) -> bool,
    {
        let applied = self.applied_versions().await?;
        let pending: Vec<MigrationDefinition> = self
            .module
            .versioned(self.namespace.as_deref())
            .into_iter()
            .filter(|(version, _)| !applied.contains(version) && filter(*version))
            .map(|(_, migration)| migration.clone())
            .collect();

        if pending.is_empty() {
            self.announcer.say("No migrations to apply");
        }

        let mut result = MigrationRunResult::default();
        for migration in &pending {
            self.run_migration(migration, MigrationDirection::Up).await?;
            result.applied.push(migration.version);
        }
        Ok(result)
    }

    /// Run the migrations of the configured profile; never recorded
    async fn apply_profile(&mut self) -> EngineResult<usize> {
        let Some(profile) = self.profile.clone() else {
            return Ok(0);
        };

        let migrations: Vec<MigrationDefinition> = self
            .module
            .profile(&profile, self.namespace.as_deref())
            .into_iter()
            .cloned()
            .collect();

        if migrations.is_empty() {
            tracing::debug!(profile = %profile, "No migrations for profile");
        }

        for migration in &migrations {
            self.run_migration(migration, MigrationDirection::Up).await?;
        }
        Ok(migrations.len())
    }

    /// Run one migration inside a transaction, including its version record
    pub(super) async fn run_migration(
        &mut self,
        migration: &MigrationDefinition,
        direction: MigrationDirection,
    ) -> EngineResult<()> {
        let (verb, statements) = match direction {
            MigrationDirection::Up => ("migrating", &migration.up),
            MigrationDirection::Down => ("reverting", &migration.down),
        };
        self.announcer
            .heading(&format!("{} {}", migration.label(), verb));
        let start_time = Instant::now();

        self.processor.begin_transaction().await?;
        match self.execute_migration(migration, direction, statements).await {
            Ok(()) => {
                self.processor.commit_transaction().await?;
                self.announcer.elapsed_time(start_time.elapsed());
                tracing::info!(version = migration.version, ?direction, "Migration finished");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = self.processor.rollback_transaction().await {
                    tracing::error!(error = %rollback_err, "Failed to roll back migration transaction");
                }
                self.announcer.error(&format!("{}: {}", migration.label(), e));
                Err(EngineError::Migration(format!(
                    "Failed to {} migration {}: {}",
                    match direction {
                        MigrationDirection::Up => "apply",
                        MigrationDirection::Down => "revert",
                    },
                    migration.label(),
                    e
                )))
            }
        }
    }

    async fn execute_migration(
        &mut self,
        migration: &MigrationDefinition,
        direction: MigrationDirection,
        statements: &[String],
    ) -> EngineResult<()> {
        for statement in statements {
            if !statement.trim().is_empty() {
                self.processor.execute(statement).await?;
            }
        }

        if migration.is_profile() {
            return Ok(());
        }

        let tracking_sql = match direction {
            MigrationDirection::Up => self
                .version_table
                .record_version_sql(migration.version, &migration.description),
            MigrationDirection::Down => self.version_table.remove_version_sql(migration.version),
        };
        self.processor.execute(&tracking_sql).await
    }
}

#[async_trait]
impl MigrationEngine for MigrationRunner {
    async fn migrate_up(&mut self) -> EngineResult<MigrationRunResult> {
        let mut result = self.apply_pending(|_| true).await?;
        result.profiles_run = self.apply_profile().await?;
        Ok(result)
    }

    async fn migrate_up_to(&mut self, version: i64) -> EngineResult<MigrationRunResult> {
        self.apply_pending(|v| v <= version).await
    }

    async fn migrate_down(&mut self, version: i64) -> EngineResult<MigrationRunResult> {
        self.revert_above(version).await
    }

    async fn rollback(&mut self, steps: u32) -> EngineResult<MigrationRunResult> {
        self.revert_latest(steps).await
    }

    async fn rollback_to_version(&mut self, version: i64) -> EngineResult<MigrationRunResult> {
        self.revert_above(version).await
    }

    async fn close(&mut self) -> EngineResult<()> {
        self.processor.close().await
    }
}
