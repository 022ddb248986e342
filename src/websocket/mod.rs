//! WebSocket Realtime Feeds
//!
//! Replaces per-screen realtime subscriptions: a signed-in client connects
//! to `/ws?token={session}`, subscribes to topics, receives a snapshot of
//! each topic, then a `change` message for every write.
//!
//! ## Topics
//!
//! - `appointments` - every appointment (administrators only)
//! - `services` - the service catalog
//! - `settings` - the published salon info
//! - `users.{id}` - a user's profile and own appointments (owner or administrator)
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket(`ws://localhost:8082/ws?token=${token}`);
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['appointments']}));
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{can_subscribe, ConnectionHub, HubConfig, HubError};
pub use messages::{ChangeKind, ClientMessage, ServerMessage, WsEvent};

pub const TOPIC_APPOINTMENTS: &str = "appointments";
pub const TOPIC_SERVICES: &str = "services";
pub const TOPIC_SETTINGS: &str = "settings";

/// Topic carrying a user's own documents
pub fn user_topic(user_id: &str) -> String {
    format!("users.{}", user_id)
}
