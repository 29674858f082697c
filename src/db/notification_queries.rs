use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::notification::Notification;

fn notification_from_row(row: &PgRow) -> Result<Notification, sqlx::Error> {
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        related_job_id: row.try_get("related_job_id")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a notification row
pub async fn create_notification(
    pool: &PgPool,
    user_id: i64,
    title: &str,
    message: &str,
    related_job_id: Option<i64>,
) -> Result<Notification, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO notifications (user_id, title, message, related_job_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, title, message, related_job_id, is_read, created_at
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(message)
    .bind(related_job_id)
    .fetch_one(pool)
    .await?;

    notification_from_row(&row)
}

/// Get a notification by id
pub async fn get_notification(
    pool: &PgPool,
    notification_id: i64,
) -> Result<Option<Notification>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, title, message, related_job_id, is_read, created_at
        FROM notifications
        WHERE id = $1
        "#,
    )
    .bind(notification_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(notification_from_row).transpose()
}

/// A user's unread notifications, newest first
pub async fn unread_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, title, message, related_job_id, is_read, created_at
        FROM notifications
        WHERE user_id = $1 AND is_read = FALSE
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(notification_from_row).collect()
}

/// Count a user's unread notifications
pub async fn unread_count(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS unread
        FROM notifications
        WHERE user_id = $1 AND is_read = FALSE
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    row.try_get("unread")
}

/// Mark a notification as read
pub async fn mark_read(
    pool: &PgPool,
    notification_id: i64,
) -> Result<Notification, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE notifications
        SET is_read = TRUE
        WHERE id = $1
        RETURNING id, user_id, title, message, related_job_id, is_read, created_at
        "#,
    )
    .bind(notification_id)
    .fetch_one(pool)
    .await?;

    notification_from_row(&row)
}

/// Count notifications attached to one job
pub async fn count_for_job(pool: &PgPool, job_id: i64) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total
        FROM notifications
        WHERE related_job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_one(pool)
    .await?;

    row.try_get("total")
}
