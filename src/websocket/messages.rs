//! WebSocket Message Types
//!
//! Defines all message types exchanged between subscribed screens and the
//! salon server.

use crate::storage::{Appointment, SalonSettings, Service, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// Topics to subscribe to (e.g., "appointments", "users.{id}")
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Kind of write that produced a change event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        connection_id: String,
        user_id: String,
    },
    /// Subscription confirmed
    Subscribed { topics: Vec<String> },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Current contents of a topic, sent right after subscribing
    Snapshot { topic: String, data: Value },
    /// A document in the topic was written
    Change {
        topic: String,
        kind: ChangeKind,
        id: String,
        /// The written document (absent for deletions)
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub topic: String,
    pub message: ServerMessage,
}

impl WsEvent {
    pub fn change(topic: &str, kind: ChangeKind, id: &str, data: Option<Value>) -> Self {
        Self {
            topic: topic.to_string(),
            message: ServerMessage::Change {
                topic: topic.to_string(),
                kind,
                id: id.to_string(),
                data,
            },
        }
    }

    /// Events for an appointment write: the board feed and the owner's feed
    pub fn appointment(kind: ChangeKind, appointment: &Appointment) -> Vec<Self> {
        let data = serde_json::to_value(appointment).ok();
        vec![
            Self::change(super::TOPIC_APPOINTMENTS, kind, &appointment.id, data.clone()),
            Self::change(&super::user_topic(&appointment.user_id), kind, &appointment.id, data),
        ]
    }

    pub fn appointment_deleted(appointment: &Appointment) -> Vec<Self> {
        vec![
            Self::change(super::TOPIC_APPOINTMENTS, ChangeKind::Deleted, &appointment.id, None),
            Self::change(
                &super::user_topic(&appointment.user_id),
                ChangeKind::Deleted,
                &appointment.id,
                None,
            ),
        ]
    }

    pub fn service(kind: ChangeKind, service: &Service) -> Self {
        Self::change(
            super::TOPIC_SERVICES,
            kind,
            &service.id,
            serde_json::to_value(service).ok(),
        )
    }

    pub fn service_deleted(id: &str) -> Self {
        Self::change(super::TOPIC_SERVICES, ChangeKind::Deleted, id, None)
    }

    pub fn settings(settings: &SalonSettings) -> Self {
        Self::change(
            super::TOPIC_SETTINGS,
            ChangeKind::Updated,
            "salon_info",
            serde_json::to_value(settings).ok(),
        )
    }

    pub fn profile(profile: &UserProfile) -> Self {
        Self::change(
            &super::user_topic(&profile.id),
            ChangeKind::Updated,
            &profile.id,
            serde_json::to_value(profile).ok(),
        )
    }
}
