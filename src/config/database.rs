//! Key/value store configuration.

use serde::Deserialize;

use super::defaults::default_db_path;

/// Storage engine backing the ACL store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// Durable embedded redb database.
    #[default]
    Redb,
    /// Process-local map; state is lost on exit.
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Storage engine (default: redb).
    #[serde(default)]
    pub backend: DatabaseBackend,
    /// Path to the redb database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Wipe persistent state before start.
    #[serde(default)]
    pub clear: bool,
    /// Run integrity check and repair on open.
    #[serde(default)]
    pub recover: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            path: default_db_path(),
            clear: false,
            recover: false,
        }
    }
}
