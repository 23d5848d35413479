// crates/db/src/repository.rs
//! The job queue seen as a repository.
//!
//! Job dispatch code depends on [`JobRepository`] rather than on
//! [`Database`] directly, so it can be handed any store that keeps the
//! admission contract.

use crate::{Database, DbResult};
use async_trait::async_trait;
use docrepo_core::{Fingerprint, Job, JobId, JobState};

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// True when no stored job has the same fingerprint. Never writes.
    async fn is_unique_in_queue(&self, job: &Job) -> DbResult<bool>;

    /// Persist `job`, assigning its id when it is new.
    async fn store(&self, job: &mut Job) -> DbResult<JobId>;

    async fn get(&self, id: JobId) -> DbResult<Option<Job>>;

    async fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> DbResult<Option<Job>>;

    /// Remove the row; returns whether one existed.
    async fn delete(&self, id: JobId) -> DbResult<bool>;

    async fn count(&self, label: Option<&str>, state: Option<JobState>) -> DbResult<i64>;

    async fn list_by_label(
        &self,
        label: &str,
        state: Option<JobState>,
        limit: Option<i64>,
    ) -> DbResult<Vec<Job>>;
}

#[async_trait]
impl JobRepository for Database {
    async fn is_unique_in_queue(&self, job: &Job) -> DbResult<bool> {
        Database::is_unique_in_queue(self, job).await
    }

    async fn store(&self, job: &mut Job) -> DbResult<JobId> {
        self.store_job(job).await
    }

    async fn get(&self, id: JobId) -> DbResult<Option<Job>> {
        self.get_job(id).await
    }

    async fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> DbResult<Option<Job>> {
        self.find_job_by_fingerprint(fingerprint).await
    }

    async fn delete(&self, id: JobId) -> DbResult<bool> {
        self.delete_job(id).await
    }

    async fn count(&self, label: Option<&str>, state: Option<JobState>) -> DbResult<i64> {
        self.count_jobs(label, state).await
    }

    async fn list_by_label(
        &self,
        label: &str,
        state: Option<JobState>,
        limit: Option<i64>,
    ) -> DbResult<Vec<Job>> {
        self.list_jobs(Some(label), state, limit).await
    }
}
