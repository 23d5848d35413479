// crates/db/src/queries/mod.rs
// CRUD operations for the docrepo SQLite database.

mod documents;
mod jobs;
mod notes;
