use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::db::user_queries;
use crate::error::ApiError;
use crate::models::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::models::user::UserResponse;
use crate::services::auth;

/// POST /api/v1/auth/register — create a new account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;

    if user_queries::find_by_email(&state.db, &request.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "email already registered: {}",
            request.email
        )));
    }

    let password_hash = auth::hash_password(&request.password)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user =
        user_queries::create_user(&state.db, &request.full_name, &request.email, &password_hash)
            .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /api/v1/auth/login — verify credentials and issue a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let user = user_queries::find_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid email or password".into()))?;

    let verified = auth::verify_password(&request.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !verified {
        return Err(ApiError::Unauthorized("invalid email or password".into()));
    }

    let token = state
        .auth
        .generate_token(&user.email)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        email: user.email,
        full_name: user.full_name,
    }))
}
