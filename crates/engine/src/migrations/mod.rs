//! Migration System
//!
//! Versioned migration definitions and the runner applying them.

pub mod definitions;
pub mod rollback;
pub mod runner;
pub mod version_table;

pub use definitions::*;
pub use runner::{MigrationEngine, MigrationRunner};
pub use version_table::{VersionTable, DEFAULT_VERSION_TABLE};
