/// Databases with a built-in processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseType {
    Postgres,
    Sqlite,
}

impl DatabaseType {
    /// Built-in types in provider-matching order
    pub fn all() -> [DatabaseType; 2] {
        [DatabaseType::Postgres, DatabaseType::Sqlite]
    }

    /// Dialect name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            DatabaseType::Postgres => "postgres",
            DatabaseType::Sqlite => "sqlite",
        }
    }

    /// Lowercase fragments identifying this database in a provider name
    fn provider_markers(&self) -> &'static [&'static str] {
        match self {
            DatabaseType::Postgres => &["postgres", "npgsql"],
            DatabaseType::Sqlite => &["sqlite"],
        }
    }

    pub fn matches_provider(&self, provider: &str) -> bool {
        let provider = provider.to_lowercase();
        self.provider_markers().iter().any(|m| provider.contains(m))
    }

    /// Per-connection statement applying the timeout
    pub fn timeout_statement(&self, timeout_secs: u32) -> String {
        let millis = u64::from(timeout_secs) * 1000;
        match self {
            DatabaseType::Postgres => format!("SET statement_timeout = {}", millis),
            DatabaseType::Sqlite => format!("PRAGMA busy_timeout = {}", millis),
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
