//! Connection settings for the SQLite engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path SQLite treats as a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// SQLite journal mode, applied with `PRAGMA journal_mode` when the connection opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    #[default]
    Wal,
    Memory,
    Truncate,
}

impl JournalMode {
    /// Returns the pragma value for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "delete",
            JournalMode::Wal => "wal",
            JournalMode::Memory => "memory",
            JournalMode::Truncate => "truncate",
        }
    }
}

/// Settings for opening a [`SqliteEngine`](crate::SqliteEngine).
///
/// Every field has a default, so partial configuration files deserialize:
///
/// ```ignore
/// let config: SqliteConfig = serde_json::from_str(r#"{ "path": "app.db" }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file, or `:memory:` for a private in-memory database.
    pub path: String,
    /// Journal mode for file databases. In-memory databases keep SQLite's default.
    pub journal_mode: JournalMode,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: IN_MEMORY.to_string(),
            journal_mode: JournalMode::default(),
            busy_timeout_ms: 5000,
        }
    }
}

impl SqliteConfig {
    /// Returns `true` if the configured path opens an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path.is_empty() || self.path == IN_MEMORY || self.path.starts_with("file::memory:")
    }

    /// Returns the busy timeout as a [`Duration`].
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_a_private_in_memory_database() {
        let config = SqliteConfig::default();
        assert!(config.is_in_memory());
        assert_eq!(config.journal_mode, JournalMode::Wal);
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_configuration_fills_in_defaults() {
        let config: SqliteConfig =
            serde_json::from_str(r#"{ "path": "inventory.db", "journal_mode": "truncate" }"#).unwrap();
        assert_eq!(config.path, "inventory.db");
        assert_eq!(config.journal_mode, JournalMode::Truncate);
        assert_eq!(config.busy_timeout_ms, 5000);
        assert!(!config.is_in_memory());
    }
}
