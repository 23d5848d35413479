// crates/db/src/queries/jobs.rs
//! Job queue persistence with fingerprint-based deduplication.

use crate::{now_unix, Database, DbError, DbResult};
use docrepo_core::{Fingerprint, Job, JobId, JobState, ValidationError};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, instrument, warn};

const JOB_COLUMNS: &str = "id, label, data, fingerprint, state, errors, created_at";

/// Raw `jobs` row.
#[derive(Debug, Clone)]
struct JobRow {
    id: i64,
    label: String,
    data: String,
    fingerprint: String,
    state: Option<String>,
    errors: Option<String>,
    created_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for JobRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            label: row.try_get("label")?,
            data: row.try_get("data")?,
            fingerprint: row.try_get("fingerprint")?,
            state: row.try_get("state")?,
            errors: row.try_get("errors")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl JobRow {
    fn into_job(self) -> DbResult<Job> {
        let state = JobState::from_column(self.state.as_deref()).map_err(ValidationError::from)?;
        let job = Job::from_stored(
            self.id,
            self.label,
            self.data,
            state,
            self.errors,
            self.created_at,
        );
        if job.fingerprint().as_str() != self.fingerprint {
            warn!(
                job.id = self.id,
                stored = %self.fingerprint,
                "Stored fingerprint does not match job content"
            );
        }
        Ok(job)
    }
}

/// Map a failed write, singling out a collision on `jobs.fingerprint`.
fn map_write_error(err: sqlx::Error, fingerprint: &Fingerprint) -> DbError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.message().contains("jobs.fingerprint") {
            return DbError::DuplicateJob {
                fingerprint: fingerprint.clone(),
            };
        }
    }
    DbError::Persistence(err)
}

fn push_job_filters<'a>(
    qb: &mut QueryBuilder<'a, Sqlite>,
    label: Option<&'a str>,
    state: Option<JobState>,
) {
    let mut sep = " WHERE ";
    if let Some(label) = label {
        qb.push(sep).push("label = ").push_bind(label);
        sep = " AND ";
    }
    if let Some(state) = state {
        qb.push(sep);
        match state.to_column() {
            None => qb.push("state IS NULL"),
            Some(value) => qb.push("state = ").push_bind(value),
        };
    }
}

impl Database {
    /// True when no stored job has the same fingerprint as `job`.
    ///
    /// Read-only. The answer can be stale by the time the caller stores the
    /// job; the UNIQUE constraint behind [`Database::store_job`] is what
    /// actually keeps duplicates out.
    pub async fn is_unique_in_queue(&self, job: &Job) -> DbResult<bool> {
        let fingerprint = job.fingerprint();
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM jobs WHERE fingerprint = ? LIMIT 1")
                .bind(fingerprint.as_str())
                .fetch_optional(self.pool())
                .await?;
        Ok(existing.is_none())
    }

    /// Insert a transient job, or update the row of a persisted one.
    ///
    /// On insert the job is assigned its id and creation time. Returns
    /// [`DbError::DuplicateJob`] when another row already has the fingerprint.
    #[instrument(skip_all, fields(job.label = %job.label(), job.id = ?job.id()))]
    pub async fn store_job(&self, job: &mut Job) -> DbResult<JobId> {
        job.validate(self.job_limits())?;
        let fingerprint = job.fingerprint();

        if let Some(id) = job.id() {
            let result = sqlx::query(
                "UPDATE jobs SET label = ?, data = ?, fingerprint = ?, state = ?, errors = ? WHERE id = ?",
            )
            .bind(job.label())
            .bind(job.data())
            .bind(fingerprint.as_str())
            .bind(job.state().to_column())
            .bind(job.errors())
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_write_error(e, &fingerprint))?;

            if result.rows_affected() == 0 {
                return Err(DbError::NotFound { entity: "job", id });
            }
            debug!(%fingerprint, "Updated job");
            return Ok(id);
        }

        let created_at = now_unix();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO jobs (label, data, fingerprint, state, errors, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(job.label())
        .bind(job.data())
        .bind(fingerprint.as_str())
        .bind(job.state().to_column())
        .bind(job.errors())
        .bind(created_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, &fingerprint))?;

        job.mark_persisted(id, created_at);
        debug!(job.id = id, %fingerprint, "Stored job");
        Ok(id)
    }

    /// Check-and-insert in one statement.
    ///
    /// Returns `Some(id)` when the job was admitted and `None` when an
    /// equivalent job is already queued. A job that already has an id is never
    /// re-admitted.
    #[instrument(skip_all, fields(job.label = %job.label()))]
    pub async fn enqueue_unique(&self, job: &mut Job) -> DbResult<Option<JobId>> {
        if job.is_persisted() {
            return Ok(None);
        }
        job.validate(self.job_limits())?;
        let fingerprint = job.fingerprint();
        let created_at = now_unix();

        let id: Option<i64> = sqlx::query_scalar(
            "INSERT INTO jobs (label, data, fingerprint, state, errors, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(fingerprint) DO NOTHING
             RETURNING id",
        )
        .bind(job.label())
        .bind(job.data())
        .bind(fingerprint.as_str())
        .bind(job.state().to_column())
        .bind(job.errors())
        .bind(created_at)
        .fetch_optional(self.pool())
        .await?;

        match id {
            Some(id) => {
                job.mark_persisted(id, created_at);
                debug!(job.id = id, %fingerprint, "Enqueued job");
            }
            None => debug!(%fingerprint, "Equivalent job already queued"),
        }
        Ok(id)
    }

    pub async fn get_job(&self, id: JobId) -> DbResult<Option<Job>> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        row.map(JobRow::into_job).transpose()
    }

    pub async fn find_job_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> DbResult<Option<Job>> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE fingerprint = ?"))
                .bind(fingerprint.as_str())
                .fetch_optional(self.pool())
                .await?;
        row.map(JobRow::into_job).transpose()
    }

    /// Remove a job row. Returns whether a row was deleted.
    pub async fn delete_job(&self, id: JobId) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            debug!(job.id = id, "Deleted job");
        }
        Ok(deleted)
    }

    /// Count jobs, optionally filtered by label and state.
    pub async fn count_jobs(&self, label: Option<&str>, state: Option<JobState>) -> DbResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM jobs");
        push_job_filters(&mut qb, label, state);
        let count: i64 = qb.build_query_scalar::<i64>().fetch_one(self.pool()).await?;
        Ok(count)
    }

    /// List jobs in insertion order, optionally filtered by label and state.
    pub async fn list_jobs(
        &self,
        label: Option<&str>,
        state: Option<JobState>,
        limit: Option<i64>,
    ) -> DbResult<Vec<Job>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));
        push_job_filters(&mut qb, label, state);
        qb.push(" ORDER BY id ASC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        let rows: Vec<JobRow> = qb.build_query_as::<JobRow>().fetch_all(self.pool()).await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbError};
    use docrepo_core::{Job, JobLimits, JobState, ValidationError};

    fn job(label: &str, data: &str) -> Job {
        Job::new(label, data)
    }

    #[tokio::test]
    async fn test_unique_on_empty_table() {
        let db = Database::new_in_memory().await.unwrap();
        assert!(db.is_unique_in_queue(&job("JobTest", "somedata")).await.unwrap());
        assert!(db.is_unique_in_queue(&Job::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_stored_fingerprint_matches_job() {
        let db = Database::new_in_memory().await.unwrap();
        let mut j = job("JobTest", "somedata");
        let id = db.store_job(&mut j).await.unwrap();
        assert_eq!(j.id(), Some(id));
        assert!(j.created_at().is_some());

        let stored: String = sqlx::query_scalar("SELECT fingerprint FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(stored, j.fingerprint().as_str());
    }

    #[tokio::test]
    async fn test_same_content_is_not_unique_after_store() {
        let db = Database::new_in_memory().await.unwrap();
        let mut a = job("JobTest", "somedata");
        db.store_job(&mut a).await.unwrap();

        let b = job("JobTest", "somedata");
        assert!(!db.is_unique_in_queue(&b).await.unwrap());
        assert!(db.is_unique_in_queue(&job("JobTest", "otherdata")).await.unwrap());
        assert!(db.is_unique_in_queue(&job("OtherJob", "somedata")).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_duplicate_is_rejected() {
        let db = Database::new_in_memory().await.unwrap();
        db.store_job(&mut job("JobTest", "somedata")).await.unwrap();

        let mut dup = job("JobTest", "somedata");
        let err = db.store_job(&mut dup).await.unwrap_err();
        assert!(err.is_duplicate(), "expected DuplicateJob, got {err:?}");
        assert_eq!(dup.id(), None, "rejected job stays transient");
        assert_eq!(db.count_jobs(None, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_unique() {
        let db = Database::new_in_memory().await.unwrap();
        let mut first = job("index", "doc-1");
        let id = db.enqueue_unique(&mut first).await.unwrap();
        assert!(id.is_some());
        assert_eq!(first.id(), id);

        let mut second = job("index", "doc-1");
        assert_eq!(db.enqueue_unique(&mut second).await.unwrap(), None);
        assert!(!second.is_persisted());

        // Already persisted: not admitted again.
        assert_eq!(db.enqueue_unique(&mut first).await.unwrap(), None);
        assert_eq!(db.count_jobs(Some("index"), None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_persisted_job() {
        let db = Database::new_in_memory().await.unwrap();
        let mut j = job("JobTest", "somedata");
        let id = db.store_job(&mut j).await.unwrap();

        j.set_state(JobState::Failed)
            .set_errors(Some("worker crashed".into()));
        assert_eq!(db.store_job(&mut j).await.unwrap(), id);

        let loaded = db.get_job(id).await.unwrap().unwrap();
        assert_eq!(loaded.state(), JobState::Failed);
        assert_eq!(loaded.errors(), Some("worker crashed"));
        assert_eq!(loaded.fingerprint(), j.fingerprint());
        assert_eq!(db.count_jobs(None, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_into_existing_fingerprint_is_duplicate() {
        let db = Database::new_in_memory().await.unwrap();
        db.store_job(&mut job("a", "1")).await.unwrap();
        let mut b = job("b", "1");
        db.store_job(&mut b).await.unwrap();

        b.set_label("a");
        let err = db.store_job(&mut b).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_update_deleted_job_is_not_found() {
        let db = Database::new_in_memory().await.unwrap();
        let mut j = job("JobTest", "somedata");
        let id = db.store_job(&mut j).await.unwrap();
        assert!(db.delete_job(id).await.unwrap());

        let err = db.store_job(&mut j).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "job", id: missing } if missing == id));
    }

    #[tokio::test]
    async fn test_delete_frees_fingerprint() {
        let db = Database::new_in_memory().await.unwrap();
        let mut j = job("JobTest", "somedata");
        let id = db.store_job(&mut j).await.unwrap();

        assert!(db.delete_job(id).await.unwrap());
        assert!(!db.delete_job(id).await.unwrap());
        assert!(db.get_job(id).await.unwrap().is_none());
        assert!(db.is_unique_in_queue(&job("JobTest", "somedata")).await.unwrap());
    }

    #[tokio::test]
    async fn test_validation_runs_before_write() {
        let db = Database::new_in_memory().await.unwrap().with_job_limits(JobLimits {
            max_label_len: 4,
            max_data_bytes: 4,
        });

        let err = db.store_job(&mut job("", "x")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(ValidationError::EmptyLabel)));

        let err = db.store_job(&mut job("label", "x")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::LabelTooLong { .. })
        ));

        let err = db.enqueue_unique(&mut job("ok", "12345")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::DataTooLarge { .. })
        ));
        assert_eq!(db.count_jobs(None, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_fingerprint() {
        let db = Database::new_in_memory().await.unwrap();
        let mut j = job("JobTest", "somedata");
        let id = db.store_job(&mut j).await.unwrap();

        let found = db
            .find_job_by_fingerprint(&j.fingerprint())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), Some(id));
        assert_eq!(found, j);

        let missing = job("JobTest", "other").fingerprint();
        assert!(db.find_job_by_fingerprint(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_and_list_filters() {
        let db = Database::new_in_memory().await.unwrap();
        for i in 0..3 {
            db.store_job(&mut job("index", &format!("doc-{i}"))).await.unwrap();
        }
        let mut failed = job("index", "doc-broken");
        failed.set_state(JobState::Failed);
        db.store_job(&mut failed).await.unwrap();
        db.store_job(&mut job("mail", "to=admin")).await.unwrap();

        assert_eq!(db.count_jobs(None, None).await.unwrap(), 5);
        assert_eq!(db.count_jobs(Some("index"), None).await.unwrap(), 4);
        assert_eq!(
            db.count_jobs(Some("index"), Some(JobState::Pending)).await.unwrap(),
            3
        );
        assert_eq!(db.count_jobs(None, Some(JobState::Failed)).await.unwrap(), 1);
        assert_eq!(
            db.count_jobs(Some("mail"), Some(JobState::Processing)).await.unwrap(),
            0
        );

        let pending = db
            .list_jobs(Some("index"), Some(JobState::Pending), Some(2))
            .await
            .unwrap();
        let data: Vec<&str> = pending.iter().map(|j| j.data()).collect();
        assert_eq!(data, vec!["doc-0", "doc-1"]);

        let all = db.list_jobs(None, None, None).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].id() < w[1].id()));
    }

    #[tokio::test]
    async fn test_check_constraint_rejects_raw_invalid_state() {
        let db = Database::new_in_memory().await.unwrap();
        let result = sqlx::query(
            "INSERT INTO jobs (label, data, fingerprint, state, created_at) VALUES ('x', '', 'abc', 'done', 0)",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err(), "CHECK constraint should reject 'done'");
    }
}
