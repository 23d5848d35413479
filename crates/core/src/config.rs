// crates/core/src/config.rs
//! Repository configuration.
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional TOML file and `DOCREPO_*` environment variables. The resulting
//! [`RepoConfig`] is handed to the database constructor; nothing reads it from
//! global state.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment override for the database file.
pub const ENV_DB_PATH: &str = "DOCREPO_DB";
/// Environment override for [`JobLimits::max_label_len`].
pub const ENV_MAX_LABEL_LEN: &str = "DOCREPO_MAX_LABEL_LEN";
/// Environment override for [`JobLimits::max_data_bytes`].
pub const ENV_MAX_DATA_BYTES: &str = "DOCREPO_MAX_DATA_BYTES";

/// Size limits applied to jobs before they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobLimits {
    pub max_label_len: usize,
    pub max_data_bytes: usize,
}

impl Default for JobLimits {
    fn default() -> Self {
        Self {
            max_label_len: 50,
            max_data_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// SQLite file; `None` means [`crate::paths::db_path`].
    pub database_path: Option<PathBuf>,
    pub jobs: JobLimits,
}

impl RepoConfig {
    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        toml::from_str(&raw).map_err(|e| ConfigError::MalformedToml {
            path: path.to_owned(),
            message: e.to_string(),
        })
    }

    /// Apply `DOCREPO_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` in place of the process environment.
    ///
    /// Unparseable numbers are ignored with a warning and the previous value kept.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(n) = parse_env_usize(&lookup, ENV_MAX_LABEL_LEN) {
            self.jobs.max_label_len = n;
        }
        if let Some(n) = parse_env_usize(&lookup, ENV_MAX_DATA_BYTES) {
            self.jobs.max_data_bytes = n;
        }
    }

    /// Configured database path, falling back to the platform default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(crate::paths::db_path)
    }
}

fn parse_env_usize(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring non-numeric config override");
            None
        }
    }
}
