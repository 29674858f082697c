use chrono::Duration;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::job::{AnalysisJob, JobStatus};

fn job_from_row(row: &PgRow) -> Result<AnalysisJob, sqlx::Error> {
    let status_str: String = row.try_get("status")?;
    let status = match status_str.as_str() {
        "completed" => JobStatus::Completed,
        _ => JobStatus::Pending,
    };

    Ok(AnalysisJob {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        exercise_name: row.try_get("exercise_name")?,
        video_url: row.try_get("video_url")?,
        status,
        correct_reps: row.try_get("correct_reps")?,
        wrong_reps: row.try_get("wrong_reps")?,
        feedback: row.try_get("feedback")?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

/// Insert a new pending analysis job
pub async fn create_job(
    pool: &PgPool,
    user_id: i64,
    exercise_name: &str,
    video_url: &str,
) -> Result<AnalysisJob, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO analysis_jobs (user_id, exercise_name, video_url, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING id, user_id, exercise_name, video_url, status,
                  correct_reps, wrong_reps, feedback, created_at, completed_at
        "#,
    )
    .bind(user_id)
    .bind(exercise_name)
    .bind(video_url)
    .fetch_one(pool)
    .await?;

    job_from_row(&row)
}

/// Get a job by ID
pub async fn get_job(pool: &PgPool, job_id: i64) -> Result<Option<AnalysisJob>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, exercise_name, video_url, status,
               correct_reps, wrong_reps, feedback, created_at, completed_at
        FROM analysis_jobs
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// Atomically transition a pending job to completed with its result fields.
///
/// The `status = 'pending'` guard is the per-row compare-and-set: of N
/// concurrent calls for the same job, exactly one gets the updated row back;
/// the rest get `None` and take the idempotent path.
pub async fn complete_job(
    pool: &PgPool,
    job_id: i64,
    correct_reps: i32,
    wrong_reps: i32,
    feedback: &str,
) -> Result<Option<AnalysisJob>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE analysis_jobs
        SET status = 'completed',
            correct_reps = $2,
            wrong_reps = $3,
            feedback = $4,
            completed_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING id, user_id, exercise_name, video_url, status,
                  correct_reps, wrong_reps, feedback, created_at, completed_at
        "#,
    )
    .bind(job_id)
    .bind(correct_reps)
    .bind(wrong_reps)
    .bind(feedback)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// Completed-job counts per exercise name for one user
pub async fn category_counts(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT exercise_name, COUNT(*) AS completed_count
        FROM analysis_jobs
        WHERE user_id = $1 AND status = 'completed'
        GROUP BY exercise_name
        ORDER BY completed_count DESC, exercise_name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok((
                row.try_get("exercise_name")?,
                row.try_get("completed_count")?,
            ))
        })
        .collect()
}

/// Completed jobs for one user and exercise name, newest first
pub async fn completed_by_exercise(
    pool: &PgPool,
    user_id: i64,
    exercise_name: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<AnalysisJob>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, exercise_name, video_url, status,
               correct_reps, wrong_reps, feedback, created_at, completed_at
        FROM analysis_jobs
        WHERE user_id = $1 AND exercise_name = $2 AND status = 'completed'
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(exercise_name)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(job_from_row).collect()
}

/// Totals across all of a user's completed jobs.
#[derive(Debug)]
pub struct CompletedTotals {
    pub jobs: i64,
    pub correct_reps: i64,
    pub wrong_reps: i64,
}

pub async fn completed_totals(
    pool: &PgPool,
    user_id: i64,
) -> Result<CompletedTotals, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS jobs,
               COALESCE(SUM(correct_reps), 0)::BIGINT AS correct_reps,
               COALESCE(SUM(wrong_reps), 0)::BIGINT AS wrong_reps
        FROM analysis_jobs
        WHERE user_id = $1 AND status = 'completed'
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(CompletedTotals {
        jobs: row.try_get("jobs")?,
        correct_reps: row.try_get("correct_reps")?,
        wrong_reps: row.try_get("wrong_reps")?,
    })
}

/// Count jobs still pending past the dispatch timeout (for the sweeper)
pub async fn count_stale_pending(
    pool: &PgPool,
    stale_after: Duration,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS stale
        FROM analysis_jobs
        WHERE status = 'pending'
          AND created_at < NOW() - make_interval(secs => $1)
        "#,
    )
    .bind(stale_after.num_seconds() as f64)
    .fetch_one(pool)
    .await?;

    row.try_get("stale")
}
