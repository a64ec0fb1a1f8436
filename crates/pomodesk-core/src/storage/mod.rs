mod config;
mod document;
pub mod migrations;
mod store;

pub use config::{Config, NotificationsConfig, PersistenceConfig};
pub use document::{
    Document, PomodoroEntry, Repeat, Report, Settings, SettingsPatch, Subtask, Task, TaskDraft,
    TaskPatch, CURRENT_VERSION,
};
pub use store::{local_day, PersistPolicy, Store};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `POMODESK_DATA_DIR` wins outright. Otherwise `~/.config/pomodesk[-dev]/`,
/// with the `-dev` suffix when `POMODESK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMODESK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMODESK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomodesk-dev")
            } else {
                base_dir.join("pomodesk")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
