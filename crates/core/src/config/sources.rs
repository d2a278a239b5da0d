use std::path::PathBuf;

/// Where the authoritative connection string came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSource {
    /// Entry adopted from a `<target>.config` file
    ConfigFile { path: PathBuf, name: String },
    /// Connection string passed explicitly on the command line
    Explicit,
    /// Nothing usable was found
    Unresolved,
}

impl ConnectionSource {
    /// Check if source is a configuration file entry
    pub fn is_config_file(&self) -> bool {
        matches!(self, ConnectionSource::ConfigFile { .. })
    }

    /// Check if source is an explicit connection string
    pub fn is_explicit(&self) -> bool {
        matches!(self, ConnectionSource::Explicit)
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConnectionSource::ConfigFile { path, name } => {
                format!("Connection '{}' from configuration file {}", name, path.display())
            }
            ConnectionSource::Explicit => "Explicit connection string".to_string(),
            ConnectionSource::Unresolved => "Unresolved".to_string(),
        }
    }
}

impl std::fmt::Display for ConnectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Output of the connection resolution stage.
///
/// Exactly one source is authoritative: either a config-file entry or the
/// explicit connection string, never a mix of both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionResolution {
    pub dialect: Option<String>,
    pub connection_name: Option<String>,
    pub connection_string: Option<String>,
    pub source: ConnectionSource,
}

impl ConnectionResolution {
    /// Nothing was resolved; the dialect may still come from the command line
    pub fn unresolved(dialect: Option<String>) -> Self {
        Self {
            dialect,
            connection_name: None,
            connection_string: None,
            source: ConnectionSource::Unresolved,
        }
    }

    /// Use an explicit connection string verbatim
    pub fn explicit(dialect: Option<String>, connection_string: impl Into<String>) -> Self {
        Self {
            dialect,
            connection_name: None,
            connection_string: Some(connection_string.into()),
            source: ConnectionSource::Explicit,
        }
    }

    /// Adopt a named entry from a configuration file
    pub fn from_config_file(
        dialect: impl Into<String>,
        name: impl Into<String>,
        connection_string: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        let name = name.into();
        Self {
            dialect: Some(dialect.into()),
            connection_name: Some(name.clone()),
            connection_string: Some(connection_string.into()),
            source: ConnectionSource::ConfigFile {
                path: path.into(),
                name,
            },
        }
    }
}
