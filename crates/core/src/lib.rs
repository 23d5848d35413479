// crates/core/src/lib.rs
pub mod config;
pub mod document;
pub mod error;
pub mod job;
pub mod paths;

pub use config::{JobLimits, RepoConfig};
pub use document::{Document, Note};
pub use error::*;
pub use job::{Fingerprint, Job, JobId};

pub use docrepo_types::{InvalidEnumValue, JobState, NoteVisibility, ServerState};
