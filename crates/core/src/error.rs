// crates/core/src/error.rs
use docrepo_types::InvalidEnumValue;
use std::path::PathBuf;
use thiserror::Error;

/// Input rejected before it reaches the store.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("job label must not be empty")]
    EmptyLabel,

    #[error("job label is {len} characters long (max {max})")]
    LabelTooLong { len: usize, max: usize },

    #[error("job data is {len} bytes (max {max})")]
    DataTooLarge { len: usize, max: usize },

    #[error(transparent)]
    InvalidEnum(#[from] InvalidEnumValue),

    #[error("job data is not valid JSON for the requested type: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("malformed fingerprint {0:?}")]
    InvalidFingerprint(String),

    #[error("document type must not be empty")]
    EmptyDocumentType,

    #[error("note message must not be empty")]
    EmptyNoteMessage,
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed TOML in {path}: {message}")]
    MalformedToml { path: PathBuf, message: String },
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}
