//! Where tokentrack keeps its files.
//!
//! Config lives in the platform config directory, the persisted session
//! token in the platform data directory. `TOKENTRACK_CONFIG` and
//! `TOKENTRACK_TOKEN_FILE` override the two file locations.

use std::path::PathBuf;

use directories::ProjectDirs;
use tokentrack_runtime_config::CONFIG_FILE_NAME;

pub const CONFIG_PATH_ENV: &str = "TOKENTRACK_CONFIG";
pub const TOKEN_PATH_ENV: &str = "TOKENTRACK_TOKEN_FILE";
pub const TOKEN_FILE_NAME: &str = "session-token";

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("could not determine a home directory for config and data files")]
    NoHome,
}

fn project_dirs() -> Result<ProjectDirs, PathError> {
    ProjectDirs::from("", "", "tokentrack").ok_or(PathError::NoHome)
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Platform config directory (e.g. `~/.config/tokentrack/`).
pub fn config_dir() -> Result<PathBuf, PathError> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Platform data directory (e.g. `~/.local/share/tokentrack/`).
pub fn data_dir() -> Result<PathBuf, PathError> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Config file path, honoring `TOKENTRACK_CONFIG`.
pub fn config_path() -> Result<PathBuf, PathError> {
    match env_path(CONFIG_PATH_ENV) {
        Some(path) => Ok(path),
        None => Ok(config_dir()?.join(CONFIG_FILE_NAME)),
    }
}

/// Persisted session token path, honoring `TOKENTRACK_TOKEN_FILE`.
pub fn token_path() -> Result<PathBuf, PathError> {
    match env_path(TOKEN_PATH_ENV) {
        Some(path) => Ok(path),
        None => Ok(data_dir()?.join(TOKEN_FILE_NAME)),
    }
}
