//! WebSocket route handler.
//!
//! Handles WebSocket upgrade, message loop, and cleanup.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::connection::ConnectionManager;
use super::messages::{msg_types, system, ClientMessage, ServerMessage};
use crate::server::metrics::WS_ACTIVE_CONNECTIONS;
use crate::server::session::Session;
use crate::server::state::GuardedConnectionManager;

/// WebSocket upgrade handler.
///
/// This is the route handler for `GET /v1/ws`. It validates the session and
/// upgrades the connection to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    session: Session,
    State(connection_manager): State<GuardedConnectionManager>,
) -> Response {
    debug!("WebSocket upgrade for user {}", session.user_id);
    ws.on_upgrade(move |socket| handle_socket(socket, session.user_id, connection_manager))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, user_id: usize, manager: Arc<ConnectionManager>) {
    // Register connection and get receiver for outgoing messages
    let (connection_id, outgoing_rx) = manager.register(user_id).await;
    WS_ACTIVE_CONNECTIONS.inc();

    debug!(
        "WebSocket connected: user {} connection {}",
        user_id, connection_id
    );

    let (ws_sink, ws_stream) = socket.split();

    let connected_msg = ServerMessage::new(
        msg_types::CONNECTED,
        system::Connected {
            connection_id,
            server_version: format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")),
        },
    );

    // Spawn task to forward outgoing messages to the WebSocket
    let outgoing_handle = tokio::spawn(forward_outgoing(ws_sink, outgoing_rx, connected_msg));

    // Process incoming messages until the client goes away
    process_incoming(ws_stream, user_id, connection_id, &manager).await;

    debug!(
        "WebSocket disconnected: user {} connection {}",
        user_id, connection_id
    );
    outgoing_handle.abort();

    manager.unregister(user_id, connection_id).await;
    WS_ACTIVE_CONNECTIONS.dec();
}

/// Forward messages from the outgoing channel to the WebSocket.
async fn forward_outgoing(
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut outgoing_rx: mpsc::Receiver<ServerMessage>,
    initial_msg: ServerMessage,
) {
    // Send initial connected message
    if let Ok(json) = serde_json::to_string(&initial_msg) {
        if ws_sink.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    // Forward all subsequent messages
    while let Some(msg) = outgoing_rx.recv().await {
        match serde_json::to_string(&msg) {
            Ok(json) => {
                if ws_sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to serialize WebSocket message: {}", e);
            }
        }
    }
}

/// Process incoming messages from the WebSocket.
async fn process_incoming(
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    user_id: usize,
    connection_id: usize,
    manager: &ConnectionManager,
) {
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    handle_client_message(user_id, connection_id, msg, manager).await;
                }
                Err(e) => {
                    debug!("Failed to parse client message: {}", e);
                    let error_msg = ServerMessage::new(
                        msg_types::ERROR,
                        system::Error::new(
                            "parse_error",
                            format!("Invalid message format: {}", e),
                        ),
                    );
                    let _ = manager
                        .send_to_connection(user_id, connection_id, error_msg)
                        .await;
                }
            },
            Ok(Message::Binary(_)) => {
                debug!("Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                // Axum/tungstenite handles pong automatically
                debug!("Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!("Received pong");
            }
            Ok(Message::Close(_)) => {
                debug!("Received close frame");
                break;
            }
            Err(e) => {
                debug!("WebSocket error: {}", e);
                break;
            }
        }
    }
}

/// Handle a parsed client message.
async fn handle_client_message(
    user_id: usize,
    connection_id: usize,
    msg: ClientMessage,
    manager: &ConnectionManager,
) {
    match msg.msg_type.as_str() {
        msg_types::PING => {
            let pong = ServerMessage::new(msg_types::PONG, system::Pong);
            let _ = manager
                .send_to_connection(user_id, connection_id, pong)
                .await;
        }
        other => {
            debug!("Unknown message type: {}", other);
            let error_msg = ServerMessage::new(
                msg_types::ERROR,
                system::Error::new("unknown_type", format!("Unknown message type: {}", other)),
            );
            let _ = manager
                .send_to_connection(user_id, connection_id, error_msg)
                .await;
        }
    }
}
