//! Migration sources
//!
//! A [`MigrationSource`] turns either a precompiled module identifier or a
//! directory of migration sources into a loaded [`MigrationModule`].

pub mod diagnostics;
pub mod module_loader;

#[cfg(feature = "compiler")]
pub mod compiler;

pub use diagnostics::{Diagnostic, Severity};
pub use module_loader::ModuleLoader;

#[cfg(feature = "compiler")]
pub use compiler::{SourceCompiler, SOURCE_EXTENSION};

use migrun_core::{Announcer, ResolvedConfig};

use crate::error::{EngineError, EngineResult};
use crate::migrations::MigrationModule;

/// Provider of a loaded migration module
pub trait MigrationSource {
    /// Human-readable origin, for logs
    fn describe(&self) -> String;

    /// Load or build the module
    fn load(&self, announcer: &dyn Announcer) -> EngineResult<MigrationModule>;
}

/// Pick the source for a configuration; a migration directory wins over a target
pub fn for_config(config: &ResolvedConfig) -> EngineResult<Box<dyn MigrationSource>> {
    if let Some(directory) = &config.migration_directory {
        return compiling_source(directory, &config.dialect);
    }

    match &config.module_path {
        Some(path) => Ok(Box::new(ModuleLoader::new(path.clone()))),
        None => Err(EngineError::Configuration(
            "Target module or migration directory is required (--target or --migration-directory)"
                .to_string(),
        )),
    }
}

#[cfg(feature = "compiler")]
fn compiling_source(
    directory: &std::path::Path,
    dialect: &str,
) -> EngineResult<Box<dyn MigrationSource>> {
    Ok(Box::new(SourceCompiler::new(directory.to_path_buf(), dialect)))
}

#[cfg(not(feature = "compiler"))]
fn compiling_source(
    directory: &std::path::Path,
    _dialect: &str,
) -> EngineResult<Box<dyn MigrationSource>> {
    Err(EngineError::Discovery(format!(
        "Compiling migration sources is not supported by this build: {}",
        directory.display()
    )))
}
