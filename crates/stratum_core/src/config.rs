//! # World Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) is a valid configuration.
//!
//! ```toml
//! initial_rows = 1024
//! log_failed_systems = true
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{StorageError, StorageResult};

/// Tunables applied when a world is built.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Rows reserved in every buffer at build time.
    pub initial_rows: u16,
    /// Log an error for each system that reports failure.
    pub log_failed_systems: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_rows: 0,
            log_failed_systems: true,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        toml::from_str(text).map_err(|e| StorageError::InvalidConfig(e.to_string()))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StorageError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}
