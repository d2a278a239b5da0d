//! Migration Definitions - Core types for migration modules
//!
//! A [`MigrationModule`] is the loaded set of migration definitions handed to
//! the engine, whether it came from a precompiled module file or from
//! compiling a directory of sources.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single versioned migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationDefinition {
    /// Version number; unique within a module, ignored for profile migrations
    pub version: i64,
    /// Human-readable description
    pub description: String,
    /// Namespace the migration was declared in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Profile name; profile migrations are not versioned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Statements applying the migration
    #[serde(default)]
    pub up: Vec<String>,
    /// Statements reverting the migration
    #[serde(default)]
    pub down: Vec<String>,
}

impl MigrationDefinition {
    pub fn new(version: i64, description: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            namespace: None,
            profile: None,
            up: Vec::new(),
            down: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_up(mut self, statement: impl Into<String>) -> Self {
        self.up.push(statement.into());
        self
    }

    pub fn with_down(mut self, statement: impl Into<String>) -> Self {
        self.down.push(statement.into());
        self
    }

    pub fn is_profile(&self) -> bool {
        self.profile.is_some()
    }

    /// Label used in announcements
    pub fn label(&self) -> String {
        format!("{}: {}", self.version, self.description)
    }

    fn in_namespace(&self, namespace: Option<&str>) -> bool {
        match namespace {
            Some(ns) => self.namespace.as_deref() == Some(ns),
            None => true,
        }
    }
}

/// A loaded module of migration definitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationModule {
    pub name: String,
    #[serde(default)]
    pub migrations: Vec<MigrationDefinition>,
}

impl MigrationModule {
    pub fn new(name: impl Into<String>, migrations: Vec<MigrationDefinition>) -> Self {
        Self {
            name: name.into(),
            migrations,
        }
    }

    /// Versioned migrations in the namespace, keyed by version
    pub fn versioned(&self, namespace: Option<&str>) -> BTreeMap<i64, &MigrationDefinition> {
        self.migrations
            .iter()
            .filter(|m| !m.is_profile() && m.in_namespace(namespace))
            .map(|m| (m.version, m))
            .collect()
    }

    /// Profile migrations for `profile` in the namespace, in declaration order
    pub fn profile(&self, profile: &str, namespace: Option<&str>) -> Vec<&MigrationDefinition> {
        self.migrations
            .iter()
            .filter(|m| m.profile.as_deref() == Some(profile) && m.in_namespace(namespace))
            .collect()
    }
}

/// Outcome of an engine operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationRunResult {
    /// Versions applied, in order
    pub applied: Vec<i64>,
    /// Versions reverted, in order
    pub reverted: Vec<i64>,
    /// Profile migrations executed
    pub profiles_run: usize,
}

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// Apply the migration (run UP statements)
    Up,
    /// Rollback the migration (run DOWN statements)
    Down,
}
