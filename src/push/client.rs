//! Push relay HTTP client

use super::{PushError, PushMessage, PushSender};
use async_trait::async_trait;
use reqwest::Client;

/// Default public relay endpoint
pub const DEFAULT_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// Configuration for the push relay client
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Relay endpoint accepting POSTed messages
    pub endpoint: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PUSH_ENDPOINT.to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// Push relay client
pub struct PushRelayClient {
    client: Client,
    config: PushConfig,
}

impl PushRelayClient {
    pub fn new(config: PushConfig) -> Result<Self, PushError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }
}

#[async_trait]
impl PushSender for PushRelayClient {
    fn name(&self) -> &str {
        "relay"
    }

    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Accept", "application/json")
            .json(message)
            .send()
            .await
            .map_err(PushError::from_request)?;

        if response.status().is_success() {
            tracing::debug!(to = %message.to, title = %message.title, "Push delivered to relay");
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(PushError::ApiError {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}
