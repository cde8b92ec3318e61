//! Per-user data directories.

use crate::error::HostError;

use desktop_ipc::contracts::AppDirs;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "agent-desktop";

/// `<platform data dir>/agent-desktop`.
#[track_caller]
pub fn default_root() -> Result<PathBuf, HostError> {
    dirs::data_dir()
        .map(|data_dir| data_dir.join(APP_DIR_NAME))
        .ok_or_else(|| HostError::Platform {
            message: "Platform data directory is unavailable".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Creates `config`, `logs` and `cache` under `root` and returns the layout.
#[track_caller]
pub fn create_app_dirs(root: &Path) -> Result<AppDirs, HostError> {
    let location = ErrorLocation::from(Location::caller());
    let config = root.join("config");
    let logs = root.join("logs");
    let cache = root.join("cache");

    for dir in [&config, &logs, &cache] {
        create_dir_all(dir).map_err(|e| HostError::Platform {
            message: format!("Failed to create {}: {e}", dir.display()),
            location,
        })?;
    }

    Ok(AppDirs {
        root: root.display().to_string(),
        config: config.display().to_string(),
        logs: logs.display().to_string(),
        cache: cache.display().to_string(),
    })
}
