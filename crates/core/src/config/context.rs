//! Invocation context
//!
//! The raw parameters of one invocation, exactly as the front end bound them.
//! Resolution stages read this value and produce new ones; nothing writes
//! back into it.

use std::path::{Path, PathBuf};

/// Extension of the file holding connection entries next to the target module
pub const CONFIG_FILE_EXTENSION: &str = "config";

/// Raw parameters for a single migration run
#[derive(Debug, Clone, Default)]
pub struct RunnerContext {
    /// Database dialect name (e.g. `postgres`, `sqlite`)
    pub database: Option<String>,
    /// Connection string, or the name of an entry in the config file
    pub connection: Option<String>,
    /// Identifier of the precompiled migration module
    pub target: Option<String>,
    /// Only run migrations declared in this namespace
    pub namespace: Option<String>,
    /// Task name (`migrate`, `rollback`, ...)
    pub task: Option<String>,
    /// Target version, 0 when unset
    pub version: i64,
    /// Rollback step count, 0 when unset
    pub steps: u32,
    /// Base directory for relative paths
    pub working_directory: Option<PathBuf>,
    /// Profile whose migrations run after migrating up
    pub profile: Option<String>,
    /// Statement timeout in seconds, 0 when unset
    pub timeout: u32,
    /// Announce statements without executing them
    pub preview_only: bool,
    /// Additional file receiving every announcement
    pub output: Option<PathBuf>,
    /// Directory of migration sources to compile instead of loading a module
    pub migration_directory: Option<PathBuf>,
    /// Treat unknown task names as a no-op instead of an error
    pub allow_unknown_task: bool,
}

impl RunnerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_preview_only(mut self, preview_only: bool) -> Self {
        self.preview_only = preview_only;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_migration_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migration_directory = Some(dir.into());
        self
    }

    pub fn with_allow_unknown_task(mut self, allow: bool) -> Self {
        self.allow_unknown_task = allow;
        self
    }

    /// Directory relative paths are resolved against
    pub fn base_directory(&self) -> PathBuf {
        match &self.working_directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Path of the precompiled module named by `target`
    pub fn module_path(&self) -> Option<PathBuf> {
        self.target
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| self.resolve(Path::new(t)))
    }

    /// `<target>.config`, next to the target module; there is none without a target
    pub fn config_file_path(&self) -> Option<PathBuf> {
        self.target
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| self.resolve(Path::new(&format!("{}.{}", t, CONFIG_FILE_EXTENSION))))
    }

    /// Migration source directory resolved against the base directory
    pub fn migration_directory_path(&self) -> Option<PathBuf> {
        self.migration_directory
            .as_deref()
            .filter(|d| !d.as_os_str().is_empty())
            .map(|d| self.resolve(d))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_directory().join(path)
        }
    }
}
