// crates/core/src/job.rs
//! Queued work items and their content fingerprint.
//!
//! A [`Job`] is identified for deduplication purposes by its label and data
//! only. State, error text, id and timestamps never feed the fingerprint, so a
//! job keeps the same fingerprint for its whole life in the queue.

use crate::config::JobLimits;
use crate::error::ValidationError;
use docrepo_types::JobState;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Row id assigned by the repository.
pub type JobId = i64;

/// Hex-encoded SHA-256 digest of a job's label and data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    /// Digest of `label` and `data`.
    ///
    /// Each part is prefixed with its byte length (u64, big endian) so that
    /// moving bytes from the label into the data always changes the digest.
    pub fn compute(label: &str, data: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [label, data] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a stored or user-supplied fingerprint.
    pub fn from_hex(value: &str) -> Result<Self, ValidationError> {
        let is_hex = value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if value.len() == Self::HEX_LEN && is_hex {
            Ok(Self(value.to_string()))
        } else {
            Err(ValidationError::InvalidFingerprint(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of queued work.
///
/// A job is *transient* until the repository stores it and assigns an id, and
/// *persisted* afterwards. There is no way back to transient.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Job {
    id: Option<JobId>,
    label: String,
    data: String,
    state: JobState,
    errors: Option<String>,
    created_at: Option<i64>,
}

impl Job {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
            ..Self::default()
        }
    }

    /// Rebuild a persisted job from its stored columns.
    pub fn from_stored(
        id: JobId,
        label: String,
        data: String,
        state: JobState,
        errors: Option<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Some(id),
            label,
            data,
            state,
            errors,
            created_at: Some(created_at),
        }
    }

    pub fn id(&self) -> Option<JobId> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Record the id and creation time assigned by the repository on insert.
    pub fn mark_persisted(&mut self, id: JobId, created_at: i64) {
        self.id = Some(id);
        self.created_at = Some(created_at);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = label.into();
        self
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn set_data(&mut self, data: impl Into<String>) -> &mut Self {
        self.data = data.into();
        self
    }

    /// Store the JSON encoding of `value` as the payload.
    pub fn set_data_json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, ValidationError> {
        self.data = serde_json::to_string(value)?;
        Ok(self)
    }

    /// Decode the payload as JSON.
    pub fn data_json<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        Ok(serde_json::from_str(&self.data)?)
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn set_state(&mut self, state: JobState) -> &mut Self {
        self.state = state;
        self
    }

    /// Set the state from its string name, rejecting anything outside [`JobState`].
    pub fn set_state_str(&mut self, state: &str) -> Result<&mut Self, ValidationError> {
        self.state = state.parse()?;
        Ok(self)
    }

    pub fn errors(&self) -> Option<&str> {
        self.errors.as_deref()
    }

    pub fn set_errors(&mut self, errors: Option<String>) -> &mut Self {
        self.errors = errors;
        self
    }

    pub fn created_at(&self) -> Option<i64> {
        self.created_at
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(&self.label, &self.data)
    }

    /// True when both jobs would be deduplicated against each other.
    pub fn same_content(&self, other: &Job) -> bool {
        self.fingerprint() == other.fingerprint()
    }

    pub fn validate(&self, limits: &JobLimits) -> Result<(), ValidationError> {
        if self.label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        let label_len = self.label.chars().count();
        if label_len > limits.max_label_len {
            return Err(ValidationError::LabelTooLong {
                len: label_len,
                max: limits.max_label_len,
            });
        }
        if self.data.len() > limits.max_data_bytes {
            return Err(ValidationError::DataTooLarge {
                len: self.data.len(),
                max: limits.max_data_bytes,
            });
        }
        Ok(())
    }
}
