use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

/// Redis list the worker pool consumes from. Part of the worker contract,
/// together with the [`QueueMessage`] payload shape.
pub const QUEUE_KEY: &str = "formcheck:analysis_jobs";

/// Wire payload handed to the analysis worker pool.
///
/// `job_id` is the correlation key the worker posts back with its results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub job_id: i64,
    pub video_url: String,
    pub exercise_name: String,
}

/// Redis-backed publisher for the analysis job queue.
///
/// Delivery is at-least-once: a message may reach the worker pool more than
/// once, and the result ingestor is idempotent against duplicate reports.
pub struct JobQueue {
    client: redis::Client,
    publish_timeout: Duration,
}

impl JobQueue {
    pub fn new(redis_url: &str, publish_timeout: Duration) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(QueueError::Redis)?;
        Ok(Self {
            client,
            publish_timeout,
        })
    }

    /// Enqueue an analysis job for the worker pool.
    ///
    /// Bounded by the publish timeout so a slow broker cannot stall the
    /// submitting request indefinitely.
    pub async fn publish(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let payload = serde_json::to_string(message).map_err(QueueError::Serialize)?;
        timeout(self.publish_timeout, self.push_payload(&payload))
            .await
            .map_err(|_| QueueError::Timeout(self.publish_timeout))?
    }

    async fn push_payload(&self, payload: &str) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, payload)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Number of messages waiting for a worker.
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let depth: u64 = conn.llen(QUEUE_KEY).await.map_err(QueueError::Redis)?;
        Ok(depth)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("publish timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wire_format_is_flat_camel_case() {
        let message = QueueMessage {
            job_id: 42,
            video_url: "http://cdn/video1.mp4".to_string(),
            exercise_name: "Squat".to_string(),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "jobId": 42,
                "videoUrl": "http://cdn/video1.mp4",
                "exerciseName": "Squat",
            })
        );
    }

    #[test]
    fn message_round_trips() {
        let payload = r#"{"jobId":7,"videoUrl":"http://x/v.mp4","exerciseName":"Pushup"}"#;
        let message: QueueMessage = serde_json::from_str(payload).unwrap();
        assert_eq!(message.job_id, 7);
        assert_eq!(message.exercise_name, "Pushup");
    }
}
