//! Pipeline integration tests.
//!
//! These exercise the full submit → enqueue → ingest → notify path against
//! live PostgreSQL and Redis instances configured via environment variables
//! (DATABASE_URL, REDIS_URL, JWT_SECRET).
//!
//! Run with: cargo test --test pipeline_test -- --ignored

use std::time::Duration;

use formcheck::{
    app_state::AppState,
    config::AppConfig,
    db::{self, job_queries, notification_queries, user_queries},
    error::ApiError,
    models::analysis::{AnalysisResultRequest, SubmitVideoRequest},
    models::job::JobStatus,
    services::{analysis, auth, notify, push::PushClient, queue, queue::JobQueue},
};

async fn test_state() -> (AppState, AppConfig) {
    let config = AppConfig::from_env().expect("Failed to load config");

    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let job_queue = JobQueue::new(
        &config.redis_url,
        Duration::from_secs(config.publish_timeout_secs),
    )
    .expect("Failed to initialize queue");

    let push = PushClient::new(
        &config.push_endpoint,
        Duration::from_secs(config.push_timeout_secs),
    )
    .expect("Failed to initialize push client");

    let keys = auth::AuthKeys::new(&config.jwt_secret, config.jwt_expiration_secs);

    (
        AppState::new(db_pool, job_queue, push, keys),
        config,
    )
}

fn unique_email(tag: &str) -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    format!("{tag}-{nanos}@example.com")
}

async fn create_test_user(state: &AppState, tag: &str) -> (i64, String) {
    let email = unique_email(tag);
    let password_hash = auth::hash_password("integration-test-pw").expect("hash failed");
    let user = user_queries::create_user(&state.db, "Test Lifter", &email, &password_hash)
        .await
        .expect("Failed to create user");
    (user.id, email)
}

fn squat_request() -> SubmitVideoRequest {
    SubmitVideoRequest {
        exercise_name: "Squat".to_string(),
        video_url: "http://x/video1".to_string(),
    }
}

fn result_for(job_id: i64, correct_reps: i32, wrong_reps: i32, feedback: &str) -> AnalysisResultRequest {
    AnalysisResultRequest {
        job_id,
        correct_reps,
        wrong_reps,
        feedback: feedback.to_string(),
    }
}

/// Drain the queue looking for the message belonging to one job.
async fn find_queued_message(redis_url: &str, job_id: i64) -> Option<queue::QueueMessage> {
    let client = redis::Client::open(redis_url).expect("Failed to open redis");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect to redis");

    loop {
        let payload: Option<String> = redis::cmd("RPOP")
            .arg(queue::QUEUE_KEY)
            .query_async(&mut conn)
            .await
            .expect("RPOP failed");

        match payload {
            Some(raw) => {
                let message: queue::QueueMessage =
                    serde_json::from_str(&raw).expect("Bad queue payload");
                if message.job_id == job_id {
                    return Some(message);
                }
            }
            None => return None,
        }
    }
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn submit_creates_pending_job_and_enqueues_message() {
    let (state, config) = test_state().await;
    let (_, email) = create_test_user(&state, "submit").await;

    let job = analysis::submit(&state, &email, &squat_request())
        .await
        .expect("submit failed");

    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.completed_at.is_none());
    assert!(job.correct_reps.is_none());
    assert!(job.wrong_reps.is_none());
    assert!(job.feedback.is_none());

    let message = find_queued_message(&config.redis_url, job.id)
        .await
        .expect("No queue message for job");
    assert_eq!(message.video_url, "http://x/video1");
    assert_eq!(message.exercise_name, "Squat");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn submit_for_unknown_user_is_not_found() {
    let (state, _) = test_state().await;

    let err = analysis::submit(&state, "nobody@example.com", &squat_request())
        .await
        .expect_err("submit should fail");
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn end_to_end_squat_scenario() {
    let (state, _) = test_state().await;
    let (_, email) = create_test_user(&state, "e2e").await;

    let job = analysis::submit(&state, &email, &squat_request())
        .await
        .expect("submit failed");
    assert_eq!(job.status, JobStatus::Pending);

    analysis::ingest_result(&state, &result_for(job.id, 6, 0, "Great form"))
        .await
        .expect("ingest failed");

    let completed = job_queries::get_job(&state.db, job.id)
        .await
        .expect("get failed")
        .expect("job vanished");
    assert_eq!(completed.status, JobStatus::Completed);
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.correct_reps, Some(6));
    assert_eq!(completed.wrong_reps, Some(0));
    assert_eq!(completed.feedback.as_deref(), Some("Great form"));

    let unread = notify::unread(&state, &email).await.expect("unread failed");
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].related_job_id, Some(job.id));
    assert!(unread[0].title.contains("Squat"));

    let count = notify::unread_count(&state, &email).await.expect("count failed");
    assert_eq!(count, 1);

    notify::mark_read(&state, &email, unread[0].id)
        .await
        .expect("mark read failed");

    let count = notify::unread_count(&state, &email).await.expect("count failed");
    assert_eq!(count, 0);

    let summary = analysis::summary(&state, &email).await.expect("summary failed");
    assert_eq!(summary.total_completed_videos, 1);
    assert_eq!(summary.total_correct_reps, 6);
    assert_eq!(summary.total_wrong_reps, 0);
    assert_eq!(summary.overall_accuracy, 100.0);

    let categories = analysis::categories(&state, &email)
        .await
        .expect("categories failed");
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].exercise_name, "Squat");
    assert_eq!(categories[0].completed_count, 1);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn duplicate_result_is_idempotent() {
    let (state, _) = test_state().await;
    let (_, email) = create_test_user(&state, "dup").await;

    let job = analysis::submit(&state, &email, &squat_request())
        .await
        .expect("submit failed");

    let report = result_for(job.id, 6, 0, "Great form");
    analysis::ingest_result(&state, &report).await.expect("first ingest failed");
    analysis::ingest_result(&state, &report).await.expect("second ingest failed");

    let stored = job_queries::get_job(&state.db, job.id)
        .await
        .expect("get failed")
        .expect("job vanished");
    assert_eq!(stored.correct_reps, Some(6));
    assert_eq!(stored.wrong_reps, Some(0));

    let notifications = notification_queries::count_for_job(&state.db, job.id)
        .await
        .expect("count failed");
    assert_eq!(notifications, 1);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn divergent_result_keeps_first_writer() {
    let (state, _) = test_state().await;
    let (_, email) = create_test_user(&state, "diverge").await;

    let job = analysis::submit(&state, &email, &squat_request())
        .await
        .expect("submit failed");

    analysis::ingest_result(&state, &result_for(job.id, 6, 0, "Great form"))
        .await
        .expect("first ingest failed");

    // A divergent duplicate is swallowed, logged, and changes nothing.
    analysis::ingest_result(&state, &result_for(job.id, 2, 4, "Poor depth"))
        .await
        .expect("divergent ingest should still ack");

    let stored = job_queries::get_job(&state.db, job.id)
        .await
        .expect("get failed")
        .expect("job vanished");
    assert_eq!(stored.correct_reps, Some(6));
    assert_eq!(stored.wrong_reps, Some(0));
    assert_eq!(stored.feedback.as_deref(), Some("Great form"));

    let notifications = notification_queries::count_for_job(&state.db, job.id)
        .await
        .expect("count failed");
    assert_eq!(notifications, 1);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn concurrent_ingest_has_single_winner() {
    let (state, _) = test_state().await;
    let (_, email) = create_test_user(&state, "race").await;

    let job = analysis::submit(&state, &email, &squat_request())
        .await
        .expect("submit failed");

    let report = result_for(job.id, 8, 2, "Solid set");
    let attempts: Vec<_> = (0..8)
        .map(|_| analysis::ingest_result(&state, &report))
        .collect();

    for outcome in futures::future::join_all(attempts).await {
        outcome.expect("every delivery must be acknowledged");
    }

    let stored = job_queries::get_job(&state.db, job.id)
        .await
        .expect("get failed")
        .expect("job vanished");
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.correct_reps, Some(8));
    assert_eq!(stored.wrong_reps, Some(2));

    let notifications = notification_queries::count_for_job(&state.db, job.id)
        .await
        .expect("count failed");
    assert_eq!(notifications, 1, "exactly one notification for N deliveries");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn unknown_job_result_is_not_found() {
    let (state, _) = test_state().await;

    let err = analysis::ingest_result(&state, &result_for(i64::MAX - 7, 1, 0, "ghost"))
        .await
        .expect_err("ingest should fail");
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn cross_user_mark_read_is_rejected() {
    let (state, _) = test_state().await;
    let (_, owner_email) = create_test_user(&state, "owner").await;
    let (_, other_email) = create_test_user(&state, "other").await;

    let job = analysis::submit(&state, &owner_email, &squat_request())
        .await
        .expect("submit failed");
    analysis::ingest_result(&state, &result_for(job.id, 6, 0, "Great form"))
        .await
        .expect("ingest failed");

    let unread = notify::unread(&state, &owner_email).await.expect("unread failed");
    assert_eq!(unread.len(), 1);

    let err = notify::mark_read(&state, &other_email, unread[0].id)
        .await
        .expect_err("cross-user mark-read must fail");
    assert!(matches!(err, ApiError::Permission(_)));

    // No state change for the owner.
    let count = notify::unread_count(&state, &owner_email)
        .await
        .expect("count failed");
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn stale_pending_jobs_are_counted() {
    let (state, _) = test_state().await;
    let (user_id, _) = create_test_user(&state, "stale").await;

    // Create the row without publishing, like a submission whose enqueue
    // silently failed.
    job_queries::create_job(&state.db, user_id, "Pushup", "http://x/video2")
        .await
        .expect("create failed");

    let stale = job_queries::count_stale_pending(&state.db, chrono::Duration::zero())
        .await
        .expect("stale count failed");
    assert!(stale >= 1);
}
