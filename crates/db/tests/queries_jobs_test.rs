//! Integration tests for the job queue's deduplication contract.

use docrepo_db::{Database, DbError, JobRepository};
use docrepo_core::{Job, JobState};

fn job_test() -> Job {
    let mut job = Job::default();
    job.set_label("JobTest").set_data("somedata");
    job
}

#[test]
fn test_two_instances_share_fingerprint() {
    let a = job_test();
    let b = job_test();
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[tokio::test]
async fn test_stored_row_carries_fingerprint() {
    let db = Database::new_in_memory().await.unwrap();
    let mut job = job_test();
    let id = db.store_job(&mut job).await.unwrap();

    let row: (String, String, String) =
        sqlx::query_as("SELECT label, data, fingerprint FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(row.0, "JobTest");
    assert_eq!(row.1, "somedata");
    assert_eq!(row.2, job.fingerprint().as_str());
}

#[tokio::test]
async fn test_is_unique_in_queue_lifecycle() {
    let db = Database::new_in_memory().await.unwrap();

    // Empty table: anything is unique.
    assert!(db.is_unique_in_queue(&job_test()).await.unwrap());

    // The check itself never writes.
    assert!(db.is_unique_in_queue(&job_test()).await.unwrap());
    assert_eq!(db.count_jobs(None, None).await.unwrap(), 0);

    db.store_job(&mut job_test()).await.unwrap();
    assert!(!db.is_unique_in_queue(&job_test()).await.unwrap());
}

#[tokio::test]
async fn test_state_does_not_make_job_unique_again() {
    let db = Database::new_in_memory().await.unwrap();
    let mut stored = job_test();
    db.store_job(&mut stored).await.unwrap();
    stored.set_state(JobState::Processing);
    db.store_job(&mut stored).await.unwrap();

    assert!(!db.is_unique_in_queue(&job_test()).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_enqueue_admits_one() {
    let tmp = tempfile::tempdir().unwrap();
    let db = Database::new(&tmp.path().join("race.db")).await.unwrap();

    let attempts = (0..8).map(|_| {
        let db = db.clone();
        tokio::spawn(async move {
            let mut job = job_test();
            db.store_job(&mut job).await
        })
    });
    let results: Vec<_> = futures_util::future::join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1, "exactly one insert should win: {results:?}");
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(result.is_duplicate(), "losers must see DuplicateJob, got {result:?}");
    }
    assert_eq!(db.count_jobs(Some("JobTest"), None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_store_on_closed_pool_is_persistence_error() {
    let db = Database::new_in_memory().await.unwrap();
    db.pool().close().await;

    let err = db.store_job(&mut job_test()).await.unwrap_err();
    assert!(matches!(err, DbError::Persistence(_)), "got {err:?}");
    assert!(!err.is_duplicate());

    let err = db.is_unique_in_queue(&job_test()).await.unwrap_err();
    assert!(matches!(err, DbError::Persistence(_)));
}

#[tokio::test]
async fn test_queue_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("queue.db");

    let id = {
        let db = Database::new(&path).await.unwrap();
        let mut job = job_test();
        let id = db.store_job(&mut job).await.unwrap();
        db.pool().close().await;
        id
    };

    let db = Database::new(&path).await.unwrap();
    let repo: &dyn JobRepository = &db;
    assert!(!repo.is_unique_in_queue(&job_test()).await.unwrap());
    let job = repo.get(id).await.unwrap().unwrap();
    assert_eq!(job.label(), "JobTest");
    assert_eq!(job.state(), JobState::Pending);
}
