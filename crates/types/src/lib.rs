// crates/types/src/lib.rs
//! Closed enumerations shared by the model and persistence crates.
//!
//! Every enum-constrained column is represented here as a tagged variant with a
//! canonical lowercase string form. Parsing happens at the boundary through
//! [`FromStr`], so an out-of-range value never reaches a setter or the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string did not match any variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} value {value:?} (expected one of: {})", .allowed.join(", "))]
pub struct InvalidEnumValue {
    pub field: &'static str,
    pub value: String,
    pub allowed: &'static [&'static str],
}

impl InvalidEnumValue {
    fn new(field: &'static str, value: &str, allowed: &'static [&'static str]) -> Self {
        Self {
            field,
            value: value.to_string(),
            allowed,
        }
    }
}

/// Processing state of a queued job.
///
/// `Pending` is the "unseen" state and is stored as SQL `NULL`; the other
/// variants are written as their lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Pending,
    Processing,
    Failed,
    Undefined,
}

impl JobState {
    pub const ALL: [JobState; 4] = [
        JobState::Pending,
        JobState::Processing,
        JobState::Failed,
        JobState::Undefined,
    ];

    const NAMES: &'static [&'static str] = &["pending", "processing", "failed", "undefined"];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Failed => "failed",
            JobState::Undefined => "undefined",
        }
    }

    /// Column value for this state (`None` for pending).
    pub fn to_column(&self) -> Option<&'static str> {
        match self {
            JobState::Pending => None,
            other => Some(other.as_str()),
        }
    }

    /// Inverse of [`JobState::to_column`].
    pub fn from_column(value: Option<&str>) -> Result<Self, InvalidEnumValue> {
        match value {
            None => Ok(JobState::Pending),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for JobState {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "processing" => Ok(JobState::Processing),
            "failed" => Ok(JobState::Failed),
            "undefined" => Ok(JobState::Undefined),
            _ => Err(InvalidEnumValue::new("job state", s, Self::NAMES)),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication state of a document on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    Published,
    #[default]
    Unpublished,
    Deleted,
    Temporary,
    Audited,
    InProgress,
    Restricted,
}

impl ServerState {
    pub const ALL: [ServerState; 7] = [
        ServerState::Published,
        ServerState::Unpublished,
        ServerState::Deleted,
        ServerState::Temporary,
        ServerState::Audited,
        ServerState::InProgress,
        ServerState::Restricted,
    ];

    const NAMES: &'static [&'static str] = &[
        "published",
        "unpublished",
        "deleted",
        "temporary",
        "audited",
        "inprogress",
        "restricted",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerState::Published => "published",
            ServerState::Unpublished => "unpublished",
            ServerState::Deleted => "deleted",
            ServerState::Temporary => "temporary",
            ServerState::Audited => "audited",
            ServerState::InProgress => "inprogress",
            ServerState::Restricted => "restricted",
        }
    }
}

impl FromStr for ServerState {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| InvalidEnumValue::new("server state", s, Self::NAMES))
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may read a note attached to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteVisibility {
    #[default]
    Private,
    Public,
}

impl NoteVisibility {
    const NAMES: &'static [&'static str] = &["private", "public"];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteVisibility::Private => "private",
            NoteVisibility::Public => "public",
        }
    }
}

impl FromStr for NoteVisibility {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(NoteVisibility::Private),
            "public" => Ok(NoteVisibility::Public),
            _ => Err(InvalidEnumValue::new("note visibility", s, Self::NAMES)),
        }
    }
}

impl fmt::Display for NoteVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
