//! Engine configuration persistence
//!
//! Stores settings in `~/.config/keystack/config.yaml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Engine settings that persist across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where saved bindings live; `~/.config/keystack/bindings` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings_dir: Option<PathBuf>,
    /// Abandon a rebind after this many ticks without a key; never when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rebind_timeout_ticks: Option<u32>,
    /// Save a handler's bindings as soon as a rebind is applied
    pub persist_on_rebind: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bindings_dir: None,
            rebind_timeout_ticks: None,
            persist_on_rebind: true,
        }
    }
}

impl EngineConfig {
    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from a file, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to a file, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Bindings directory: the override if set, else the default location
    pub fn resolved_bindings_dir(&self) -> Option<PathBuf> {
        self.bindings_dir
            .clone()
            .or_else(crate::config_paths::bindings_dir)
    }
}
