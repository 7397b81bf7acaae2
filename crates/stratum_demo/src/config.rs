//! Demo settings, read from an optional TOML file.

use std::path::Path;

use serde::Deserialize;
use stratum_core::{StorageError, StorageResult, WorldConfig};

/// Everything the demo needs to run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Cubes created at startup.
    pub entities: u16,
    /// Ticks to run.
    pub ticks: u32,
    /// Seconds per tick.
    pub delta_time: f32,
    /// Cube spin speed.
    pub radians_per_second: f32,
    /// Core world settings.
    pub world: WorldConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            entities: 8,
            ticks: 60,
            delta_time: 1.0 / 60.0,
            radians_per_second: 1.0,
            world: WorldConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] on malformed input.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        toml::from_str(text).map_err(|e| StorageError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StorageError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}
