//! Connection resolution
//!
//! Decides which connection string and dialect an invocation uses. A
//! `<target>.config` file with entries is authoritative; the explicit
//! connection only applies when there is no such file or it is empty.

use migrun_core::{ConnectionResolution, ConnectionsFile, RunnerContext};

use crate::error::EngineResult;
use crate::processors::ProcessorFactoryRegistry;

/// Resolves the connection of an invocation context
pub struct ConnectionResolver<'a> {
    registry: &'a ProcessorFactoryRegistry,
    host_name: String,
}

impl<'a> ConnectionResolver<'a> {
    /// `host_name` selects the entry when several exist and none was named
    pub fn new(registry: &'a ProcessorFactoryRegistry, host_name: impl Into<String>) -> Self {
        Self {
            registry,
            host_name: host_name.into(),
        }
    }

    pub fn resolve(&self, ctx: &RunnerContext) -> EngineResult<ConnectionResolution> {
        let explicit_dialect = ctx.database.clone().filter(|d| !d.trim().is_empty());
        let explicit_connection = ctx.connection.clone().filter(|c| !c.trim().is_empty());

        let file = match ctx.config_file_path() {
            Some(path) => ConnectionsFile::load(&path)?,
            None => None,
        };

        let file = match file.filter(|f| !f.is_empty()) {
            Some(file) => file,
            None => {
                return Ok(match explicit_connection {
                    Some(connection_string) => {
                        tracing::debug!("Using explicit connection string");
                        ConnectionResolution::explicit(explicit_dialect, connection_string)
                    }
                    None => ConnectionResolution::unresolved(explicit_dialect),
                });
            }
        };

        let entry = if file.len() == 1 {
            file.entries().first()
        } else {
            let name = explicit_connection.as_deref().unwrap_or(&self.host_name);
            tracing::debug!(name, entries = file.len(), "Selecting connection entry by name");
            file.get(name)
        };

        let Some(entry) = entry else {
            tracing::debug!(path = %file.path.display(), "No matching connection entry");
            return Ok(ConnectionResolution::unresolved(explicit_dialect));
        };

        match self.registry.factory_for_provider(&entry.provider_name) {
            Some(factory) => {
                tracing::debug!(
                    name = %entry.name,
                    provider = %entry.provider_name,
                    dialect = factory.name(),
                    "Adopted connection entry"
                );
                Ok(ConnectionResolution::from_config_file(
                    factory.name(),
                    entry.name.clone(),
                    entry.connection_string.clone(),
                    file.path.clone(),
                ))
            }
            None => {
                tracing::debug!(
                    provider = %entry.provider_name,
                    "No processor factory for connection provider"
                );
                Ok(ConnectionResolution::unresolved(explicit_dialect))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrun_core::ConnectionSource;
    use std::fs;
    use tempfile::TempDir;

    const TWO_ENTRIES: &str = r#"
connectionStrings:
  - name: build-01
    providerName: Npgsql
    connectionString: "postgres://build@db/app"
  - name: laptop
    providerName: System.Data.SQLite
    connectionString: "sqlite://app.db"
"#;

    fn context(dir: &TempDir, config: Option<&str>) -> RunnerContext {
        if let Some(config) = config {
            fs::write(dir.path().join("app.migrations.config"), config).unwrap();
        }
        RunnerContext::new()
            .with_target("app.migrations")
            .with_working_directory(dir.path())
    }

    #[test]
    fn test_explicit_connection_without_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ProcessorFactoryRegistry::with_default_factories();
        let ctx = context(&temp_dir, None)
            .with_database("sqlite")
            .with_connection("sqlite::memory:");

        let resolution = ConnectionResolver::new(&registry, "host").resolve(&ctx).unwrap();
        assert_eq!(resolution.source, ConnectionSource::Explicit);
        assert_eq!(resolution.dialect.as_deref(), Some("sqlite"));
        assert_eq!(resolution.connection_string.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn test_empty_config_file_falls_back_to_explicit() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ProcessorFactoryRegistry::with_default_factories();
        let ctx = context(&temp_dir, Some("connectionStrings: []\n"))
            .with_connection("sqlite::memory:");

        let resolution = ConnectionResolver::new(&registry, "host").resolve(&ctx).unwrap();
        assert!(resolution.source.is_explicit());
    }

    #[test]
    fn test_no_config_file_consulted_without_target() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".config"), TWO_ENTRIES).unwrap();
        let registry = ProcessorFactoryRegistry::with_default_factories();
        let ctx = RunnerContext::new()
            .with_working_directory(temp_dir.path())
            .with_migration_directory("migrations")
            .with_database("sqlite")
            .with_connection("sqlite::memory:");

        let resolution = ConnectionResolver::new(&registry, "build-01").resolve(&ctx).unwrap();
        assert!(resolution.source.is_explicit());
        assert_eq!(resolution.connection_string.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn test_host_name_selects_entry() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ProcessorFactoryRegistry::with_default_factories();
        let ctx = context(&temp_dir, Some(TWO_ENTRIES));

        let resolution = ConnectionResolver::new(&registry, "laptop").resolve(&ctx).unwrap();
        assert!(resolution.source.is_config_file());
        assert_eq!(resolution.dialect.as_deref(), Some("sqlite"));
        assert_eq!(resolution.connection_name.as_deref(), Some("laptop"));
        assert_eq!(resolution.connection_string.as_deref(), Some("sqlite://app.db"));
    }

    #[test]
    fn test_explicit_name_wins_over_host_name() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ProcessorFactoryRegistry::with_default_factories();
        let ctx = context(&temp_dir, Some(TWO_ENTRIES)).with_connection("build-01");

        let resolution = ConnectionResolver::new(&registry, "laptop").resolve(&ctx).unwrap();
        assert_eq!(resolution.dialect.as_deref(), Some("postgres"));
        assert_eq!(resolution.connection_string.as_deref(), Some("postgres://build@db/app"));
    }

    #[test]
    fn test_unknown_provider_is_unresolved() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ProcessorFactoryRegistry::with_default_factories();
        let ctx = context(
            &temp_dir,
            Some("connectionStrings:\n  - name: main\n    providerName: Oracle\n    connectionString: x\n"),
        );

        let resolution = ConnectionResolver::new(&registry, "host").resolve(&ctx).unwrap();
        assert_eq!(resolution.source, ConnectionSource::Unresolved);
        assert!(resolution.connection_string.is_none());
    }

    #[test]
    fn test_invalid_yaml_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ProcessorFactoryRegistry::with_default_factories();
        let ctx = context(&temp_dir, Some("connectionStrings: [unclosed"));

        let err = ConnectionResolver::new(&registry, "host").resolve(&ctx).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Configuration(_)));
    }
}
