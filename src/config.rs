//! Runtime configuration for a stickies project.
//!
//! Loaded from `.stickies/config.yaml` when present; every field has a
//! default so an empty or partial file is valid.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::{Geometry, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::{Result, StickiesError};

pub const CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_COLOR: &str = "#ffc";
pub const DEFAULT_QUIET_WINDOW_MS: u64 = 300;

/// Store keys for the three independently persisted values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub notes: String,
    pub id_counter: String,
    pub color: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            notes: "notes-content".to_string(),
            id_counter: "notes-id-counter".to_string(),
            color: "notes-color".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet window for coalesced writes, in milliseconds.
    pub quiet_window_ms: u64,
    /// Character that creates a note when pressed outside an input widget.
    pub quick_add_key: char,
    pub default_color: String,
    pub default_width: f64,
    pub default_height: f64,
    pub keys: StorageKeys,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiet_window_ms: DEFAULT_QUIET_WINDOW_MS,
            quick_add_key: 'n',
            default_color: DEFAULT_COLOR.to_string(),
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            keys: StorageKeys::default(),
        }
    }
}

impl Config {
    /// Load `config.yaml` from `dir`, falling back to defaults if absent.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quiet_window_ms == 0 {
            return Err(StickiesError::Config(
                "quiet_window_ms must be greater than zero".to_string(),
            ));
        }
        if !self.default_geometry().is_valid() {
            return Err(StickiesError::Config(format!(
                "default geometry {}x{} must be positive",
                self.default_width, self.default_height
            )));
        }
        if self.default_color.trim().is_empty() {
            return Err(StickiesError::Config(
                "default_color must not be blank".to_string(),
            ));
        }
        let keys = [&self.keys.notes, &self.keys.id_counter, &self.keys.color];
        if keys.iter().any(|k| k.is_empty()) {
            return Err(StickiesError::Config(
                "storage keys must not be empty".to_string(),
            ));
        }
        if keys[0] == keys[1] || keys[0] == keys[2] || keys[1] == keys[2] {
            return Err(StickiesError::Config(
                "storage keys must be distinct".to_string(),
            ));
        }
        Ok(())
    }

    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }

    pub fn default_geometry(&self) -> Geometry {
        Geometry::new(self.default_width, self.default_height)
    }
}
