use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "nexus-todo";

/// Get the base storage directory following XDG Base Directory Specification.
/// Returns `$XDG_DATA_HOME/nexus-todo`, the platform data dir, or `./.nexus-todo`.
pub fn get_storage_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data.is_empty() {
            return PathBuf::from(xdg_data).join(APP_DIR_NAME);
        }
    }

    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR_NAME),
        None => PathBuf::from(".").join(format!(".{}", APP_DIR_NAME)),
    }
}

/// Get the logs directory path.
/// Returns `{storage_dir}/logs`.
pub fn get_log_dir() -> PathBuf {
    get_storage_dir().join("logs")
}

/// Get the settings file path.
/// Returns `{storage_dir}/settings.json`.
pub fn get_settings_path() -> PathBuf {
    get_storage_dir().join("settings.json")
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
