// Cache path utilities.
// Resolves the platform cache directory and the files echoes keeps in it.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Get the base cache directory (~/.cache/echoes on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "echoes").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the locally saved preferences.
pub fn preferences_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("preferences.json"))
}

/// Directory for rolling log files.
pub fn log_dir() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("logs"))
}
