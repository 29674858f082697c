//! Notification fan-out and the notification read API.
//!
//! The persisted row is the durable, user-visible record of a completion.
//! Push delivery rides on top of it, off the request path, and its failure
//! is logged rather than surfaced.

use crate::app_state::AppState;
use crate::db::{notification_queries, user_queries};
use crate::error::ApiError;
use crate::models::job::AnalysisJob;
use crate::models::notification::Notification;

/// Persist the completion notification and kick off the best-effort push.
///
/// Called exactly once per PENDING→COMPLETED transition, after the result is
/// committed. Never returns an error: the job result is already durable, so
/// every failure here is logged and dropped.
pub async fn dispatch_job_completed(state: &AppState, job: &AnalysisJob) {
    let title = completion_title(&job.exercise_name);
    let message = completion_message(job);

    let notification = match notification_queries::create_notification(
        &state.db,
        job.user_id,
        &title,
        &message,
        Some(job.id),
    )
    .await
    {
        Ok(notification) => notification,
        Err(e) => {
            tracing::error!(job_id = job.id, error = %e, "failed to persist notification");
            return;
        }
    };

    let user = match user_queries::find_by_id(&state.db, job.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(job_id = job.id, user_id = job.user_id, "job owner vanished");
            return;
        }
        Err(e) => {
            tracing::error!(job_id = job.id, error = %e, "failed to load job owner for push");
            return;
        }
    };

    let Some(push_token) = user.push_token else {
        tracing::debug!(user_id = user.id, "no push token registered, skipping push");
        return;
    };

    // Push runs on its own task so a slow gateway cannot stall the ingesting
    // request.
    let push = state.push.clone();
    let job_id = job.id;
    tokio::spawn(async move {
        match push
            .send(
                &push_token,
                &notification.title,
                &notification.message,
                notification.related_job_id,
            )
            .await
        {
            Ok(()) => {
                tracing::info!(job_id, notification_id = notification.id, "push delivered")
            }
            Err(e) => {
                tracing::warn!(job_id, error = %e, "push delivery failed");
                metrics::counter!("push_delivery_failures_total").increment(1);
            }
        }
    });
}

/// The caller's unread notifications, newest first.
pub async fn unread(state: &AppState, owner_email: &str) -> Result<Vec<Notification>, ApiError> {
    let user = user_queries::find_by_email(&state.db, owner_email)
        .await?
        .ok_or_else(|| ApiError::not_found("user", owner_email))?;

    Ok(notification_queries::unread_for_user(&state.db, user.id).await?)
}

/// Number of unread notifications for the caller.
pub async fn unread_count(state: &AppState, owner_email: &str) -> Result<i64, ApiError> {
    let user = user_queries::find_by_email(&state.db, owner_email)
        .await?
        .ok_or_else(|| ApiError::not_found("user", owner_email))?;

    Ok(notification_queries::unread_count(&state.db, user.id).await?)
}

/// Mark one of the caller's notifications as read.
///
/// The ownership check runs before any mutation: acting on another user's
/// notification is a permission error and changes nothing.
pub async fn mark_read(
    state: &AppState,
    owner_email: &str,
    notification_id: i64,
) -> Result<Notification, ApiError> {
    let user = user_queries::find_by_email(&state.db, owner_email)
        .await?
        .ok_or_else(|| ApiError::not_found("user", owner_email))?;

    let notification = notification_queries::get_notification(&state.db, notification_id)
        .await?
        .ok_or_else(|| ApiError::not_found("notification", notification_id))?;

    if notification.user_id != user.id {
        return Err(ApiError::Permission(
            "notification belongs to another user".into(),
        ));
    }

    Ok(notification_queries::mark_read(&state.db, notification_id).await?)
}

fn completion_title(exercise_name: &str) -> String {
    format!("Your {exercise_name} analysis is ready!")
}

fn completion_message(job: &AnalysisJob) -> String {
    let correct = job.correct_reps.unwrap_or(0);
    let wrong = job.wrong_reps.unwrap_or(0);

    match job.feedback.as_deref() {
        Some(feedback) if !feedback.is_empty() => {
            format!("{correct} correct, {wrong} wrong reps. {feedback}")
        }
        _ => format!("{correct} correct, {wrong} wrong reps."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;
    use chrono::Utc;

    fn completed_job(feedback: &str) -> AnalysisJob {
        AnalysisJob {
            id: 42,
            user_id: 7,
            exercise_name: "Squat".to_string(),
            video_url: "http://x/video1".to_string(),
            status: JobStatus::Completed,
            correct_reps: Some(6),
            wrong_reps: Some(0),
            feedback: Some(feedback.to_string()),
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn title_names_the_exercise() {
        assert_eq!(completion_title("Squat"), "Your Squat analysis is ready!");
    }

    #[test]
    fn message_includes_counts_and_feedback() {
        let job = completed_job("Great form");
        assert_eq!(
            completion_message(&job),
            "6 correct, 0 wrong reps. Great form"
        );
    }

    #[test]
    fn message_without_feedback_is_just_counts() {
        let job = completed_job("");
        assert_eq!(completion_message(&job), "6 correct, 0 wrong reps.");
    }
}
