//! SQL for the table tracking applied migration versions

/// Default name of the version tracking table
pub const DEFAULT_VERSION_TABLE: &str = "version_info";

/// Statements maintaining the version tracking table
#[derive(Debug, Clone)]
pub struct VersionTable {
    table: String,
}

impl VersionTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// SQL to create the version table
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version BIGINT PRIMARY KEY,\n    \
                description VARCHAR(1024),\n    \
                applied_on TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n\
            )",
            self.table
        )
    }

    /// SQL to list applied versions
    pub fn applied_versions_sql(&self) -> String {
        format!("SELECT version FROM {} ORDER BY version", self.table)
    }

    /// SQL to record a version as applied
    pub fn record_version_sql(&self, version: i64, description: &str) -> String {
        format!(
            "INSERT INTO {} (version, description) VALUES ({}, '{}')",
            self.table,
            version,
            description.replace('\'', "''")
        )
    }

    /// SQL to remove a version record (for rollback)
    pub fn remove_version_sql(&self, version: i64) -> String {
        format!("DELETE FROM {} WHERE version = {}", self.table, version)
    }
}

impl Default for VersionTable {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_TABLE)
    }
}
