//! Sender that keeps messages in memory instead of delivering them
//!
//! Used when the relay is disabled in config, and by tests.

use super::{PushError, PushMessage, PushSender};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct OutboxPushSender {
    sent: RwLock<Vec<PushMessage>>,
}

impl OutboxPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first
    pub async fn sent(&self) -> Vec<PushMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl PushSender for OutboxPushSender {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        tracing::info!(to = %message.to, title = %message.title, body = %message.body, "Push recorded (relay disabled)");
        self.sent.write().await.push(message.clone());
        Ok(())
    }
}
