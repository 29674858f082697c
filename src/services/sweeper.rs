//! Periodic detection of jobs stuck in the pending state.
//!
//! A job can stay pending forever if its queue message was lost or the
//! worker pool never reports back. The sweeper makes that visible to
//! operators through a warning log and a gauge; it performs no automatic
//! requeue.

use std::time::Duration;

use crate::app_state::AppState;
use crate::db::job_queries;

/// Spawn the background sweep loop.
pub fn spawn(state: AppState, sweep_interval: Duration, stale_after: chrono::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            sweep_once(&state, stale_after).await;
        }
    });
}

async fn sweep_once(state: &AppState, stale_after: chrono::Duration) {
    match job_queries::count_stale_pending(&state.db, stale_after).await {
        Ok(0) => {
            metrics::gauge!("analysis_jobs_stale_pending").set(0.0);
        }
        Ok(stale) => {
            tracing::warn!(
                stale,
                stale_after_secs = stale_after.num_seconds(),
                "jobs still pending past the dispatch timeout"
            );
            metrics::gauge!("analysis_jobs_stale_pending").set(stale as f64);
        }
        Err(e) => {
            tracing::error!(error = %e, "stale job sweep failed");
        }
    }

    match state.queue.queue_depth().await {
        Ok(depth) => {
            metrics::gauge!("analysis_queue_depth").set(depth as f64);
        }
        Err(e) => {
            tracing::debug!(error = %e, "queue depth check failed");
        }
    }
}
