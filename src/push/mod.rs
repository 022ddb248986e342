//! Push Notifications
//!
//! Outbound notifications go through a push relay that accepts
//! `{to, title, body, data}` JSON messages addressed by an opaque device token.
//!
//! - [`PushRelayClient`]: HTTP client for the relay
//! - [`OutboxPushSender`]: in-memory sender that only records messages

mod client;
mod outbox;

pub use client::{PushConfig, PushRelayClient, DEFAULT_PUSH_ENDPOINT};
pub use outbox::OutboxPushSender;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Common trait for anything that can deliver a push message
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Deliver one message (no retries)
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// A single push notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushMessage {
    /// Device token issued by the relay
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl PushMessage {
    pub fn new(to: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            title: title.into(),
            body: body.into(),
            data: Value::Null,
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Errors that can occur while talking to the push relay
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Push relay unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Relay error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,
}

impl PushError {
    fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PushError::Timeout
        } else if e.is_connect() {
            PushError::Unavailable
        } else {
            PushError::Request(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let message = PushMessage::new("ExponentPushToken[abc]", "Confirmed! ✅", "See you soon")
            .data(json!({ "screen": "appointments" }));
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["to"], "ExponentPushToken[abc]");
        assert_eq!(value["data"]["screen"], "appointments");

        let bare = serde_json::to_value(PushMessage::new("t", "a", "b")).unwrap();
        assert!(bare.get("data").is_none());
    }
}
