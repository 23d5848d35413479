//! Centralized path functions for repository storage locations.

use std::path::PathBuf;

/// App data root: `~/Library/Application Support/docrepo/` (macOS) or `~/.local/share/docrepo/` (Linux).
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("docrepo"))
}

/// SQLite database file: `<app_data_dir>/docrepo.db`.
pub fn db_path() -> Option<PathBuf> {
    app_data_dir().map(|d| d.join("docrepo.db"))
}

/// Default config file: `<config_dir>/docrepo/docrepo.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docrepo").join("docrepo.toml"))
}
