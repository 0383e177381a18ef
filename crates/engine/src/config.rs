//! Store configuration loaded from `pagestore.toml` with environment overrides.
//!
//! The database location has no default: a process that cannot tell where its
//! pages live refuses to start rather than silently writing somewhere else.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "pagestore.toml";

pub const ENV_DATABASE: &str = "PAGESTORE_DATABASE";
pub const ENV_BUSY_TIMEOUT_MS: &str = "PAGESTORE_BUSY_TIMEOUT_MS";

/// Database value selecting a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no database configured; set `database` in pagestore.toml or PAGESTORE_DATABASE")]
    MissingDatabase,

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    InMemory,
}

/// Store configuration.
///
/// ```toml
/// # SQLite database file, or ":memory:"
/// database = "pages.db"
///
/// # How long a writer waits on a locked database (default: 5000)
/// busy_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn with_database(database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::with_database(IN_MEMORY)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Overlays values returned by `lookup` for the `PAGESTORE_*` keys.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            self.database = Some(database);
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            self.busy_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_BUSY_TIMEOUT_MS,
                value: raw,
            })?;
        }
        Ok(())
    }

    pub fn location(&self) -> Result<DatabaseLocation, ConfigError> {
        match self.database.as_deref() {
            None | Some("") => Err(ConfigError::MissingDatabase),
            Some(IN_MEMORY) => Ok(DatabaseLocation::InMemory),
            Some(path) => Ok(DatabaseLocation::File(PathBuf::from(path))),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
