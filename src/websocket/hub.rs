//! WebSocket Connection Hub
//!
//! Manages all WebSocket connections, their topic subscriptions, and
//! fan-out of change events.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent};
use super::{user_topic, TOPIC_APPOINTMENTS, TOPIC_SERVICES, TOPIC_SETTINGS};
use crate::auth::AuthUser;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>,
    /// Topic subscriptions: Topic → Set of ConnectionIds
    subscriptions: Arc<RwLock<HashMap<String, HashSet<ConnectionId>>>>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Signed-in user owning this connection
    pub user: AuthUser,
    pub subscriptions: HashSet<String>,
}

/// Check whether a user may follow a topic
///
/// `services` and `settings` are open to every signed-in user,
/// `appointments` to administrators, `users.{id}` to its owner and
/// administrators.
pub fn can_subscribe(user: &AuthUser, topic: &str) -> bool {
    match topic {
        TOPIC_SERVICES | TOPIC_SETTINGS => true,
        TOPIC_APPOINTMENTS => user.is_admin(),
        _ => match topic.strip_prefix("users.") {
            Some(id) if !id.is_empty() => user.is_admin() || topic == user_topic(&user.id),
            _ => false,
        },
    }
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Register a new WebSocket connection for a signed-in user
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        user: AuthUser,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        tracing::info!(connection_id = %id, user_id = %user.id, "WebSocket connected");

        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                user,
                subscriptions: HashSet::new(),
            },
        );
        Ok(id)
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics
    ///
    /// Unknown or forbidden topics are skipped; the accepted ones are returned.
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !can_subscribe(&handle.user, &topic) {
                tracing::warn!(connection_id = %id, topic = %topic, "Topic refused");
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            subs.entry(topic.clone())
                .or_default()
                .insert(id.to_string());

            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic) {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed from topics");
        Ok(unsubscribed)
    }

    /// Deliver an event to all subscribers of its topic
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        broadcast_to(&self.connections, &self.subscriptions, event).await
    }

    /// Deliver events to their subscribers in order
    ///
    /// Called from write handlers after the store accepted the write.
    pub async fn publish(&self, events: impl IntoIterator<Item = WsEvent>) -> usize {
        let mut delivered = 0;
        for event in events {
            delivered += self.broadcast(&event).await;
        }
        delivered
    }

    /// Close every connection of a user
    ///
    /// Dropping the senders ends each connection's send task. Returns the
    /// number of connections removed.
    pub async fn disconnect_user(&self, user_id: &str) -> usize {
        let mut connections = self.connections.write().await;
        let mut subs = self.subscriptions.write().await;

        let ids: Vec<ConnectionId> = connections
            .iter()
            .filter(|(_, handle)| handle.user.id == user_id)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &ids {
            let Some(handle) = connections.remove(id) else {
                continue;
            };
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        if !ids.is_empty() {
            tracing::info!(user_id = %user_id, connections = ids.len(), "WebSocket connections closed");
        }
        ids.len()
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

async fn broadcast_to(
    connections: &RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    subscriptions: &RwLock<HashMap<String, HashSet<ConnectionId>>>,
    event: &WsEvent,
) -> usize {
    // Same lock order as subscribe/unsubscribe
    let connections = connections.read().await;
    let subs = subscriptions.read().await;

    let mut sent_count = 0;
    if let Some(ids) = subs.get(&event.topic) {
        for id in ids {
            if let Some(handle) = connections.get(id) {
                if handle.sender.send(event.message.clone()).is_ok() {
                    sent_count += 1;
                }
            }
        }
    }

    if sent_count > 0 {
        tracing::trace!(topic = %event.topic, subscribers = sent_count, "Broadcast event");
    }
    sent_count
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
