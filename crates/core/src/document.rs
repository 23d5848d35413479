// crates/core/src/document.rs
//! Documents and the notes attached to them.

use crate::error::ValidationError;
use docrepo_types::{NoteVisibility, ServerState};
use serde::{Deserialize, Serialize};

/// A repository document, reduced to the fields the model layer manages itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Option<i64>,
    pub doc_type: String,
    pub server_state: ServerState,
    pub language: Option<String>,
    /// Unix seconds; set by the repository on first store.
    pub server_date_created: Option<i64>,
    /// Unix seconds; refreshed by the repository on every store.
    pub server_date_modified: Option<i64>,
}

impl Document {
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            ..Self::default()
        }
    }

    /// Set the publication state from its string name.
    pub fn set_server_state_str(&mut self, state: &str) -> Result<(), ValidationError> {
        self.server_state = state.parse()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.doc_type.trim().is_empty() {
            return Err(ValidationError::EmptyDocumentType);
        }
        Ok(())
    }
}

/// Free-text note attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Option<i64>,
    pub document_id: i64,
    pub message: String,
    pub creator: Option<String>,
    pub visibility: NoteVisibility,
}

impl Note {
    pub fn new(document_id: i64, message: impl Into<String>) -> Self {
        Self {
            document_id,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn set_visibility_str(&mut self, visibility: &str) -> Result<(), ValidationError> {
        self.visibility = visibility.parse()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyNoteMessage);
        }
        Ok(())
    }
}
