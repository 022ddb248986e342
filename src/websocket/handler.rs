//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.
//! The session token travels in the query string (`/ws?token=...`) since
//! browsers cannot set headers on WebSocket requests.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};
use super::{TOPIC_APPOINTMENTS, TOPIC_SERVICES, TOPIC_SETTINGS};
use crate::api::{ApiError, AppState};
use crate::auth::AuthUser;
use crate::storage::StoreResult;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// WebSocket upgrade handler
///
/// Authenticates the session token, then upgrades the connection.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsParams>,
) -> Result<Response, ApiError> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;
    let user = state.auth.authenticate(&token).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user: AuthUser) {
    let (mut sender, mut receiver) = socket.split();
    let hub = Arc::clone(&state.ws_hub);

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let user_id = user.id.clone();

    let connection_id = match hub.register(user, tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket connection");
            let error_msg = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Ok(text) = serde_json::to_string(&error_msg) {
                let _ = sender.send(Message::Text(text)).await;
            }
            return;
        }
    };

    let connected = ServerMessage::Connected {
        connection_id: connection_id.clone(),
        user_id,
    };
    if hub.send_to(&connection_id, connected).await.is_err() {
        hub.unregister(&connection_id).await;
        return;
    }

    let conn_id_for_send = connection_id.clone();

    // Task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
    });

    let state_for_recv = Arc::clone(&state);
    let conn_id_for_recv = connection_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&state_for_recv, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    hub.unregister(&connection_id).await;
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(state: &Arc<AppState>, connection_id: &str, message: Message) -> bool {
    let hub = &state.ws_hub;

    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(state, connection_id, client_msg).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "Invalid client message"
                    );
                    let error_msg = ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = hub.send_to(connection_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error_msg).await;
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Handle a parsed client message
async fn handle_client_message(state: &Arc<AppState>, connection_id: &str, message: ClientMessage) {
    let hub: &ConnectionHub = &state.ws_hub;

    match message {
        ClientMessage::Subscribe { topics } => match hub.subscribe(connection_id, topics).await {
            Ok(subscribed) => {
                let _ = hub
                    .send_to(
                        connection_id,
                        ServerMessage::Subscribed {
                            topics: subscribed.clone(),
                        },
                    )
                    .await;

                for topic in subscribed {
                    match snapshot(state, &topic) {
                        Ok(data) => {
                            let _ = hub
                                .send_to(connection_id, ServerMessage::Snapshot { topic, data })
                                .await;
                        }
                        Err(e) => {
                            tracing::error!(topic = %topic, error = %e, "Failed to build snapshot");
                            let _ = hub
                                .send_to(
                                    connection_id,
                                    ServerMessage::Error {
                                        message: format!("Snapshot of {} failed", topic),
                                    },
                                )
                                .await;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "Subscribe error");
                let _ = hub
                    .send_to(
                        connection_id,
                        ServerMessage::Error {
                            message: e.to_string(),
                        },
                    )
                    .await;
            }
        },
        ClientMessage::Unsubscribe { topics } => {
            match hub.unsubscribe(connection_id, topics).await {
                Ok(unsubscribed) => {
                    let _ = hub
                        .send_to(
                            connection_id,
                            ServerMessage::Unsubscribed {
                                topics: unsubscribed,
                            },
                        )
                        .await;
                }
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, error = %e, "Unsubscribe error");
                    let _ = hub
                        .send_to(
                            connection_id,
                            ServerMessage::Error {
                                message: e.to_string(),
                            },
                        )
                        .await;
                }
            }
        }
        ClientMessage::Ping => {
            let _ = hub.send_to(connection_id, ServerMessage::Pong).await;
        }
    }
}

/// Current contents of an (already authorized) topic
pub fn snapshot(state: &AppState, topic: &str) -> StoreResult<Value> {
    let store = &state.store;

    let data = match topic {
        TOPIC_APPOINTMENTS => serde_json::to_value(store.list_appointments()?)?,
        TOPIC_SERVICES => serde_json::to_value(store.list_services()?)?,
        TOPIC_SETTINGS => serde_json::to_value(store.salon_settings()?)?,
        _ => {
            let user_id = topic.strip_prefix("users.").unwrap_or(topic);
            json!({
                "profile": store.get_user(user_id)?,
                "appointments": store.appointments_for_user(user_id)?,
            })
        }
    };

    Ok(data)
}
