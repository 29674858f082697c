use axum::extract::{Path, State};
use axum::Json;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::notification::{Notification, UnreadCountResponse};
use crate::services::auth::AuthUser;
use crate::services::notify;

/// GET /api/v1/notifications/unread — caller's unread notifications.
pub async fn unread_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = notify::unread(&state, &user.email).await?;
    Ok(Json(notifications))
}

/// POST /api/v1/notifications/{id}/read — mark one notification as read.
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<Notification>, ApiError> {
    let notification = notify::mark_read(&state, &user.email, notification_id).await?;
    Ok(Json(notification))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let unread_count = notify::unread_count(&state, &user.email).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}
