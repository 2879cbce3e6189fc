use crate::shared::paths::{ensure_dir, get_settings_path};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ADD_DELAY_MS: u64 = 300;
pub const DEFAULT_STORAGE_KEY: &str = "todos";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_add_delay_ms")]
    pub add_delay_ms: u64,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_add_delay_ms() -> u64 {
    DEFAULT_ADD_DELAY_MS
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            add_delay_ms: default_add_delay_ms(),
            storage_key: default_storage_key(),
        }
    }
}

impl AppSettings {
    pub fn add_delay(&self) -> Duration {
        Duration::from_millis(self.add_delay_ms)
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid storage key in settings: {0:?}")]
    InvalidStorageKey(String),
}

/// Load settings from disk, returning default if file doesn't exist or is invalid
pub fn load_settings() -> AppSettings {
    load_settings_from(&get_settings_path())
}

/// Load settings from a specific path, falling back to defaults.
pub fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        tracing::info!(target: "system", "Settings file not found, using defaults");
        return AppSettings::default();
    }

    match load_settings_from_file(path) {
        Ok(settings) => {
            tracing::info!(target: "system", "Settings loaded from {:?}", path);
            settings
        }
        Err(e) => {
            tracing::warn!(target: "system", "Failed to load settings: {}, using defaults", e);
            AppSettings::default()
        }
    }
}

fn load_settings_from_file(path: &Path) -> Result<AppSettings, SettingsError> {
    let contents = std::fs::read_to_string(path)?;
    let settings: AppSettings = serde_json::from_str(&contents)?;

    if settings.storage_key.trim().is_empty() {
        return Err(SettingsError::InvalidStorageKey(settings.storage_key));
    }

    Ok(settings)
}

/// Save settings to disk
pub fn save_settings(settings: &AppSettings) -> Result<(), SettingsError> {
    save_settings_to(&get_settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        ensure_dir(dir)?;
    }

    let contents = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, contents)?;

    tracing::info!(target: "system", "Settings saved to {:?}", path);
    Ok(())
}
