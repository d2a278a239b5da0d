use migrun_core::Announcer;
use std::fs;
use std::path::PathBuf;

use super::MigrationSource;
use crate::error::{EngineError, EngineResult};
use crate::migrations::MigrationModule;

/// Loads a precompiled module: a JSON-serialized [`MigrationModule`]
pub struct ModuleLoader {
    path: PathBuf,
}

impl ModuleLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MigrationSource for ModuleLoader {
    fn describe(&self) -> String {
        format!("module {}", self.path.display())
    }

    fn load(&self, announcer: &dyn Announcer) -> EngineResult<MigrationModule> {
        if !self.path.is_file() {
            return Err(EngineError::Discovery(format!(
                "Unable to locate migration module {}",
                self.path.display()
            )));
        }

        announcer.say(&format!("Loading module {}", self.path.display()));
        let content = fs::read_to_string(&self.path)?;
        let module: MigrationModule = serde_json::from_str(&content).map_err(|e| {
            EngineError::Discovery(format!(
                "Invalid migration module {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(
            module = %module.name,
            migrations = module.migrations.len(),
            "Loaded migration module"
        );
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrun_core::NullAnnouncer;
    use tempfile::TempDir;

    #[test]
    fn test_load_module() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.migrations");
        fs::write(
            &path,
            r#"{"name":"app","migrations":[{"version":1,"description":"create users","up":["CREATE TABLE users (id INT);"]}]}"#,
        )
        .unwrap();

        let module = ModuleLoader::new(path).load(&NullAnnouncer).unwrap();
        assert_eq!(module.name, "app");
        assert_eq!(module.migrations.len(), 1);
        assert!(module.migrations[0].down.is_empty());
    }

    #[test]
    fn test_missing_module_is_discovery_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = ModuleLoader::new(temp_dir.path().join("nope"))
            .load(&NullAnnouncer)
            .unwrap_err();
        assert!(matches!(err, EngineError::Discovery(_)));
    }

    #[test]
    fn test_invalid_module_is_discovery_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken");
        fs::write(&path, "not json").unwrap();

        let err = ModuleLoader::new(path).load(&NullAnnouncer).unwrap_err();
        assert!(err.to_string().contains("Invalid migration module"));
    }
}
