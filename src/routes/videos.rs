use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::analysis::{
    AnalysisResultRequest, AnalysisSummary, ExerciseCategory, ResultAck, SubmitVideoRequest,
    VideoListParams,
};
use crate::models::job::AnalysisJob;
use crate::services::analysis;
use crate::services::auth::AuthUser;

/// POST /api/v1/videos — submit a video for analysis.
pub async fn submit_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SubmitVideoRequest>,
) -> Result<(StatusCode, Json<AnalysisJob>), ApiError> {
    request.validate()?;
    let job = analysis::submit(&state, &user.email, &request).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// POST /api/v1/videos/results — result intake from the analysis worker pool.
///
/// Unauthenticated in current scope; a worker reporting against an unknown
/// job gets a 404 with the job id echoed so it can alert instead of retrying
/// forever.
pub async fn receive_results(
    State(state): State<AppState>,
    Json(request): Json<AnalysisResultRequest>,
) -> Result<Json<ResultAck>, ApiError> {
    request.validate()?;
    analysis::ingest_result(&state, &request).await?;
    Ok(Json(ResultAck {
        job_id: request.job_id,
        status: "accepted".to_string(),
    }))
}

/// GET /api/v1/videos/categories — completed-job counts per exercise.
pub async fn analysis_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ExerciseCategory>>, ApiError> {
    let categories = analysis::categories(&state, &user.email).await?;
    Ok(Json(categories))
}

/// GET /api/v1/videos — completed jobs for one exercise, newest first.
pub async fn videos_by_exercise(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<VideoListParams>,
) -> Result<Json<Vec<AnalysisJob>>, ApiError> {
    let jobs = analysis::videos_by_exercise(&state, &user.email, &params).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/videos/summary — aggregate over all completed jobs.
pub async fn analysis_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AnalysisSummary>, ApiError> {
    let summary = analysis::summary(&state, &user.email).await?;
    Ok(Json(summary))
}
