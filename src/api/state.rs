//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::auth::{AuthManager, AuthPolicy};
use crate::push::PushSender;
use crate::reminders::{ReminderConfig, ReminderScheduler};
use crate::storage::{BlobStore, SalonStore};
use crate::websocket::{ConnectionHub, HubConfig};
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store for all collections
    pub store: Arc<SalonStore>,
    /// Blob store for avatars
    pub blobs: Arc<BlobStore>,
    /// Accounts and sessions
    pub auth: Arc<AuthManager>,
    /// Reminder registry and delivery loop
    pub reminders: Arc<ReminderScheduler>,
    /// Outbound push notifications
    pub push: Arc<dyn PushSender>,
    /// WebSocket connection hub for realtime feeds
    pub ws_hub: Arc<ConnectionHub>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<SalonStore>,
        blobs: BlobStore,
        push: Arc<dyn PushSender>,
        auth_policy: AuthPolicy,
        reminder_config: ReminderConfig,
        config: ApiConfig,
    ) -> Self {
        Self::with_ws_config(
            store,
            blobs,
            push,
            auth_policy,
            reminder_config,
            config,
            HubConfig::default(),
        )
    }

    /// Create AppState with custom WebSocket hub configuration
    pub fn with_ws_config(
        store: Arc<SalonStore>,
        blobs: BlobStore,
        push: Arc<dyn PushSender>,
        auth_policy: AuthPolicy,
        reminder_config: ReminderConfig,
        config: ApiConfig,
        hub_config: HubConfig,
    ) -> Self {
        let auth = Arc::new(AuthManager::new(Arc::clone(&store), auth_policy));
        let reminders = Arc::new(ReminderScheduler::new(
            Arc::clone(&store),
            Arc::clone(&push),
            reminder_config,
        ));

        Self {
            store,
            blobs: Arc::new(blobs),
            auth,
            reminders,
            push,
            ws_hub: Arc::new(ConnectionHub::new(hub_config)),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum request body size in bytes (bounds avatar uploads)
    pub max_body_size: usize,
    /// Base URL used when building links to blobs
    pub public_url: String,
    /// Offset of the salon's wall clock
    pub salon_offset: FixedOffset,
    /// Professional recorded on client bookings
    pub professional: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            max_body_size: 10 * 1024 * 1024, // 10MB
            public_url: "http://localhost:8082".to_string(),
            salon_offset: Utc.fix(),
            professional: "Salon team".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public URL of a user's avatar
    pub fn avatar_url(&self, user_id: &str) -> String {
        format!(
            "{}/api/v1/users/{}/avatar",
            self.public_url.trim_end_matches('/'),
            user_id
        )
    }
}
