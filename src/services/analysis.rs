//! Core analysis pipeline: job submission with queue dispatch, idempotent
//! result ingestion, and the read-side projections over completed jobs.

use crate::app_state::AppState;
use crate::db::{job_queries, user_queries};
use crate::error::ApiError;
use crate::models::analysis::{
    AnalysisResultRequest, AnalysisSummary, ExerciseCategory, SubmitVideoRequest, VideoListParams,
};
use crate::models::job::AnalysisJob;
use crate::models::user::User;
use crate::services::notify;
use crate::services::queue::QueueMessage;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Create a pending job for the caller and hand it to the queue publisher.
///
/// The job row is committed before the publish attempt. A publish failure
/// surfaces as a dependency error to the caller while the row stays pending,
/// where the stale sweeper keeps it operator-visible.
pub async fn submit(
    state: &AppState,
    owner_email: &str,
    request: &SubmitVideoRequest,
) -> Result<AnalysisJob, ApiError> {
    let user = resolve_owner(state, owner_email).await?;

    let job = job_queries::create_job(
        &state.db,
        user.id,
        &request.exercise_name,
        &request.video_url,
    )
    .await?;
    metrics::counter!("analysis_jobs_submitted_total").increment(1);

    let message = QueueMessage {
        job_id: job.id,
        video_url: job.video_url.clone(),
        exercise_name: job.exercise_name.clone(),
    };

    if let Err(e) = state.queue.publish(&message).await {
        tracing::error!(
            job_id = job.id,
            error = %e,
            "failed to enqueue analysis job, row stays pending"
        );
        metrics::counter!("queue_publish_failures_total").increment(1);
        return Err(ApiError::Dependency(format!(
            "could not enqueue analysis job {}: {e}",
            job.id
        )));
    }

    tracing::info!(
        job_id = job.id,
        user_id = user.id,
        exercise = %job.exercise_name,
        "analysis job queued"
    );
    Ok(job)
}

/// Apply a worker's completion report to the job store, idempotently.
///
/// The queue delivers at least once, so the same report may arrive any number
/// of times, possibly concurrently. The compare-and-set in
/// [`job_queries::complete_job`] lets exactly one delivery win the
/// PENDING→COMPLETED transition and trigger the single notification; every
/// other delivery lands on the already-completed path below.
pub async fn ingest_result(
    state: &AppState,
    result: &AnalysisResultRequest,
) -> Result<(), ApiError> {
    let completed = job_queries::complete_job(
        &state.db,
        result.job_id,
        result.correct_reps,
        result.wrong_reps,
        &result.feedback,
    )
    .await?;

    let Some(job) = completed else {
        let Some(existing) = job_queries::get_job(&state.db, result.job_id).await? else {
            return Err(ApiError::not_found("analysis job", result.job_id));
        };

        // Job exists but was completed by an earlier delivery. First writer
        // wins; a divergent payload is recorded, never applied.
        if existing.has_result(result.correct_reps, result.wrong_reps, &result.feedback) {
            tracing::debug!(job_id = existing.id, "duplicate result delivery ignored");
        } else {
            tracing::warn!(
                job_id = existing.id,
                correct_reps = result.correct_reps,
                wrong_reps = result.wrong_reps,
                "divergent result for already-completed job, keeping first result"
            );
            metrics::counter!("analysis_results_divergent_total").increment(1);
        }
        return Ok(());
    };

    metrics::counter!("analysis_jobs_completed_total").increment(1);
    tracing::info!(
        job_id = job.id,
        correct_reps = result.correct_reps,
        wrong_reps = result.wrong_reps,
        "analysis job completed"
    );

    // The result is committed; everything from here is best-effort fan-out
    // and must never fail the ingestion.
    notify::dispatch_job_completed(state, &job).await;

    Ok(())
}

/// Completed-job counts per exercise name for the caller.
pub async fn categories(
    state: &AppState,
    owner_email: &str,
) -> Result<Vec<ExerciseCategory>, ApiError> {
    let user = resolve_owner(state, owner_email).await?;
    let counts = job_queries::category_counts(&state.db, user.id).await?;

    Ok(counts
        .into_iter()
        .map(|(exercise_name, completed_count)| ExerciseCategory {
            exercise_name,
            completed_count,
        })
        .collect())
}

/// Completed jobs for the caller filtered by exercise name, newest first.
pub async fn videos_by_exercise(
    state: &AppState,
    owner_email: &str,
    params: &VideoListParams,
) -> Result<Vec<AnalysisJob>, ApiError> {
    let user = resolve_owner(state, owner_email).await?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let jobs = job_queries::completed_by_exercise(
        &state.db,
        user.id,
        &params.exercise_name,
        limit,
        offset,
    )
    .await?;
    Ok(jobs)
}

/// Aggregate summary over all of the caller's completed jobs.
pub async fn summary(state: &AppState, owner_email: &str) -> Result<AnalysisSummary, ApiError> {
    let user = resolve_owner(state, owner_email).await?;
    let totals = job_queries::completed_totals(&state.db, user.id).await?;

    Ok(AnalysisSummary {
        total_completed_videos: totals.jobs,
        total_correct_reps: totals.correct_reps,
        total_wrong_reps: totals.wrong_reps,
        overall_accuracy: overall_accuracy(totals.correct_reps, totals.wrong_reps),
    })
}

/// Percentage of correct reps across completed jobs; 0 when there are no
/// reps at all.
pub fn overall_accuracy(correct_reps: i64, wrong_reps: i64) -> f64 {
    let total = correct_reps + wrong_reps;
    if total == 0 {
        return 0.0;
    }
    (correct_reps as f64 / total as f64) * 100.0
}

async fn resolve_owner(state: &AppState, email: &str) -> Result<User, ApiError> {
    user_queries::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| ApiError::not_found("user", email))
}
