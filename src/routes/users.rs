use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::db::user_queries;
use crate::error::ApiError;
use crate::models::auth::PushTokenRequest;
use crate::services::auth::AuthUser;

/// PUT /api/v1/users/push-token — store the caller's push delivery token.
pub async fn register_push_token(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PushTokenRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    let owner = user_queries::find_by_email(&state.db, &user.email)
        .await?
        .ok_or_else(|| ApiError::not_found("user", &user.email))?;

    user_queries::set_push_token(&state.db, owner.id, &request.push_token).await?;

    tracing::info!(user_id = owner.id, "push token registered");
    Ok(StatusCode::NO_CONTENT)
}
