use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-facing event produced by a job completion.
///
/// The stored row is the durable record; push delivery on top of it is
/// best-effort only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub related_job_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}
