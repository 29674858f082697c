use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Client for the Expo-compatible push delivery gateway.
///
/// Delivery is fire-and-forget: the notification row persisted before any
/// push attempt is the durable record, and gateway failures never propagate
/// past this module's caller.
pub struct PushClient {
    http: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    data: PushData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushData {
    related_video_id: Option<i64>,
}

impl PushClient {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, PushError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(PushError::Http)?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    /// Send one push message to a registered device token.
    ///
    /// The gateway response body is logged, never interpreted beyond HTTP
    /// success/failure.
    pub async fn send(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        related_job_id: Option<i64>,
    ) -> Result<(), PushError> {
        let payload = PushPayload {
            to: push_token,
            title,
            body,
            data: PushData {
                related_video_id: related_job_id,
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(PushError::Http)?;

        let status = response.status();
        let response_body = response.text().await.unwrap_or_default();

        if status.is_success() {
            tracing::debug!(%status, response = %response_body, "push gateway accepted message");
            Ok(())
        } else {
            Err(PushError::Gateway {
                status: status.as_u16(),
                body: response_body,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("push gateway rejected message: status {status}, body: {body}")]
    Gateway { status: u16, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_gateway_format() {
        let payload = PushPayload {
            to: "ExponentPushToken[abc123]",
            title: "Your Squat analysis is ready!",
            body: "6 correct, 0 wrong reps.",
            data: PushData {
                related_video_id: Some(42),
            },
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "to": "ExponentPushToken[abc123]",
                "title": "Your Squat analysis is ready!",
                "body": "6 correct, 0 wrong reps.",
                "data": { "relatedVideoId": 42 },
            })
        );
    }
}
