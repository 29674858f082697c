use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Closed failure taxonomy for the pipeline and its HTTP surface.
///
/// Every fallible operation returns one of these kinds explicitly; nothing
/// in the service is treated as process-fatal.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("missing or invalid credentials: {0}")]
    Unauthorized(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("dependency failure: {0}")]
    Dependency(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ApiError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Permission(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Dependency(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        ApiError::Validation(report.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs, not in the response body.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            let body = Json(json!({ "error": "internal server error" }));
            return (status, body).into_response();
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
