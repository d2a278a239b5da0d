//! Migration Rollback - Reverts applied migrations
//!
//! Applied versions are reverted newest first by running their DOWN
//! statements. Versions missing from the loaded module (another namespace,
//! or removed sources) are skipped.

use super::definitions::{MigrationDefinition, MigrationDirection, MigrationRunResult};
use super::runner::MigrationRunner;
use crate::error::EngineResult;

impl MigrationRunner {
    /// Revert every applied version greater than `version`
    pub(super) async fn revert_above(&mut self, version: i64) -> EngineResult<MigrationRunResult> {
        let applied = self.applied_versions().await?;
        let targets: Vec<i64> = applied.into_iter().rev().filter(|v| *v > version).collect();
        self.revert_versions(targets).await
    }

    /// Revert the `steps` most recently applied versions
    pub(super) async fn revert_latest(&mut self, steps: u32) -> EngineResult<MigrationRunResult> {
        let applied = self.applied_versions().await?;
        let targets: Vec<i64> = applied.into_iter().rev().take(steps as usize).collect();
        self.revert_versions(targets).await
    }

    async fn revert_versions(&mut self, versions: Vec<i64>) -> EngineResult<MigrationRunResult> {
        let known = self.module.versioned(self.namespace.as_deref());
        let mut migrations: Vec<MigrationDefinition> = Vec::new();
        for version in versions {
            match known.get(&version) {
                Some(migration) => migrations.push((*migration).clone()),
                None => {
                    tracing::warn!(version, module = %self.module.name, "Applied version not found in module");
                    self.announcer
                        .say(&format!("Skipping version {}: not found in module", version));
                }
            }
        }
        drop(known);

        if migrations.is_empty() {
            self.announcer.say("No migrations to revert");
        }

        let mut result = MigrationRunResult::default();
        for migration in &migrations {
            self.run_migration(migration, MigrationDirection::Down).await?;
            result.reverted.push(migration.version);
        }
        Ok(result)
    }
}
