//! LINE Messaging API push

use async_trait::async_trait;
use serde::Serialize;
use shared::models::ReservationSnapshot;

use super::NotifyError;

const PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";

#[async_trait]
pub trait LinePusher: Send + Sync {
    async fn push(&self, line_user_id: &str, text: &str) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Push text for a confirmed reservation
pub fn render_push(snapshot: &ReservationSnapshot) -> String {
    format!(
        "{name}, your reservation for {party} on {date} at {time} is confirmed.",
        name = snapshot.name,
        party = snapshot.party_size,
        date = snapshot.date,
        time = snapshot.time,
    )
}

/// HTTP client for the LINE push endpoint
pub struct LineMessagingClient {
    http: reqwest::Client,
    channel_token: String,
    endpoint: String,
}

impl LineMessagingClient {
    pub fn new(http: reqwest::Client, channel_token: impl Into<String>) -> Self {
        Self {
            http,
            channel_token: channel_token.into(),
            endpoint: PUSH_ENDPOINT.to_string(),
        }
    }

    /// Point at a different endpoint (staging gateway, local stub)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl LinePusher for LineMessagingClient {
    async fn push(&self, line_user_id: &str, text: &str) -> Result<(), NotifyError> {
        let body = PushRequest {
            to: line_user_id,
            messages: [TextMessage { kind: "text", text }],
        };

        self.http
            .post(&self.endpoint)
            .bearer_auth(&self.channel_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        tracing::debug!(line_user_id = %line_user_id, "LINE push sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_body_shape() {
        let body = PushRequest {
            to: "U123",
            messages: [TextMessage {
                kind: "text",
                text: "hello",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"to": "U123", "messages": [{"type": "text", "text": "hello"}]})
        );
    }
}
