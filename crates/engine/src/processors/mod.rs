//! Database processors
//!
//! A processor executes statements against one database dialect. Processors
//! are built by a [`ProcessorFactory`], looked up by dialect name or by the
//! provider identifier of a config-file connection entry.

pub mod database_type;
pub mod sqlx_processor;

pub use database_type::DatabaseType;
pub use sqlx_processor::{SqlxProcessor, SqlxProcessorFactory};

use async_trait::async_trait;
use migrun_core::Announcer;
use std::sync::Arc;

use crate::error::EngineResult;

/// Options handed verbatim to [`ProcessorFactory::create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Announce statements without executing them
    pub preview_only: bool,
    /// Statement timeout in seconds
    pub timeout: u32,
}

/// Executes SQL for a single dialect
#[async_trait]
pub trait Processor: Send {
    /// Execute a statement, inside the open transaction if there is one
    async fn execute(&mut self, sql: &str) -> EngineResult<()>;

    /// Run a query whose first column is a version number
    async fn fetch_versions(&mut self, sql: &str) -> EngineResult<Vec<i64>>;

    async fn begin_transaction(&mut self) -> EngineResult<()>;

    async fn commit_transaction(&mut self) -> EngineResult<()>;

    async fn rollback_transaction(&mut self) -> EngineResult<()>;

    /// Release the connection; an open transaction is rolled back
    async fn close(&mut self) -> EngineResult<()>;
}

/// Builds processors for one dialect
#[async_trait]
pub trait ProcessorFactory: Send + Sync {
    /// Dialect name (e.g. `postgres`)
    fn name(&self) -> &str;

    /// Whether a config-file provider identifier targets this dialect
    fn is_for_provider(&self, provider: &str) -> bool;

    async fn create(
        &self,
        connection_string: &str,
        announcer: Arc<dyn Announcer>,
        options: ProcessorOptions,
    ) -> EngineResult<Box<dyn Processor>>;
}

/// Ordered registry of processor factories.
///
/// Lookups scan in registration order and the first match wins.
#[derive(Default, Clone)]
pub struct ProcessorFactoryRegistry {
    factories: Vec<Arc<dyn ProcessorFactory>>,
}

impl ProcessorFactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Registry with the built-in sqlx factories
    pub fn with_default_factories() -> Self {
        let mut registry = Self::new();
        for database_type in DatabaseType::all() {
            registry.register(Arc::new(SqlxProcessorFactory::new(database_type)));
        }
        registry
    }

    /// Register a factory after the existing ones
    pub fn register(&mut self, factory: Arc<dyn ProcessorFactory>) {
        self.factories.push(factory);
    }

    /// Factory for a dialect name, case-insensitive
    pub fn get_factory(&self, name: &str) -> Option<Arc<dyn ProcessorFactory>> {
        self.factories
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// First factory accepting the provider identifier
    pub fn factory_for_provider(&self, provider: &str) -> Option<Arc<dyn ProcessorFactory>> {
        self.factories
            .iter()
            .find(|f| f.is_for_provider(provider))
            .cloned()
    }

    /// Registered dialect names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.factories.iter().map(|f| f.name().to_string()).collect()
    }
}
