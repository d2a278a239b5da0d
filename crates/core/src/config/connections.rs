//! Connection entries read from `<target>.config`
//!
//! The file is YAML with a single `connectionStrings` list. Only the entries
//! are consumed; nothing else in the file is interpreted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::validation::ConfigError;

/// A named connection string with the provider it targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEntry {
    pub name: String,
    pub provider_name: String,
    pub connection_string: String,
}

/// Parsed contents of a connections file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsFile {
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(default)]
    pub connection_strings: Vec<ConnectionEntry>,
}

impl ConnectionsFile {
    /// Load the file at `path`; `Ok(None)` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        // An empty file is a file with no entries
        if content.trim().is_empty() {
            return Ok(Some(Self {
                path: path.to_path_buf(),
                connection_strings: Vec::new(),
            }));
        }

        let mut file: ConnectionsFile =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.display().to_string(),
                source,
            })?;
        file.path = path.to_path_buf();

        tracing::debug!(
            path = %path.display(),
            entries = file.connection_strings.len(),
            "Loaded connections file"
        );
        Ok(Some(file))
    }

    pub fn entries(&self) -> &[ConnectionEntry] {
        &self.connection_strings
    }

    pub fn len(&self) -> usize {
        self.connection_strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connection_strings.is_empty()
    }

    /// Exact, case-sensitive lookup by entry name
    pub fn get(&self, name: &str) -> Option<&ConnectionEntry> {
        self.connection_strings.iter().find(|e| e.name == name)
    }
}
