use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered account. Owns analysis jobs and notifications.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user, without the credential hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
        }
    }
}
