//! WebSocket message types.
//!
//! Defines the generic message envelope format used for all WebSocket
//! communication. Feature-specific payloads are carried as JSON values,
//! allowing extensibility.

use serde::{Deserialize, Serialize};

/// Server -> Client message envelope.
///
/// All messages from server to client use this format. The `msg_type` field
/// is used for routing (e.g., "connected", "notification", "comment_update").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerMessage {
    /// Message type identifier
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Feature-specific payload (JSON value)
    pub payload: serde_json::Value,
}

impl ServerMessage {
    /// Create a new server message with the given type and payload.
    pub fn new(msg_type: impl Into<String>, payload: impl Serialize) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Create a server message with a null payload.
    pub fn empty(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: serde_json::Value::Null,
        }
    }
}

/// Client -> Server message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientMessage {
    /// Message type identifier
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Feature-specific payload (JSON value)
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// System-level messages (not feature-specific).
pub mod system {
    use serde::{Deserialize, Serialize};

    /// Sent immediately after connection is established.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct Connected {
        pub connection_id: usize,
        pub server_version: String,
    }

    /// Heartbeat request (client -> server). Server responds with `Pong`.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct Ping;

    /// Heartbeat response (server -> client).
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct Pong;

    /// Sent when the server encounters an error processing a client message.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct Error {
        pub code: String,
        pub message: String,
    }

    impl Error {
        pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
            Self {
                code: code.into(),
                message: message.into(),
            }
        }
    }
}

/// Reserved message type constants.
pub mod msg_types {
    /// Sent by server on successful connection.
    pub const CONNECTED: &str = "connected";
    /// Client heartbeat request.
    pub const PING: &str = "ping";
    /// Server heartbeat response.
    pub const PONG: &str = "pong";
    /// Server error response.
    pub const ERROR: &str = "error";
    /// A notification pushed to its recipient (server -> client).
    pub const NOTIFICATION: &str = "notification";
    /// A comment was created/edited/deleted/restored (server -> all clients).
    pub const COMMENT_UPDATE: &str = "comment_update";
}

/// Comment-related message payloads.
pub mod comments {
    use serde::{Deserialize, Serialize};

    /// Payload for comment_update messages.
    ///
    /// Broadcast to ALL connected clients after a successful comment
    /// mutation. Clients should refresh their comment list upon receiving
    /// this.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct CommentUpdateMessage {
        /// What happened: "created", "updated", "deleted" or "restored".
        pub action: String,
        /// The affected comment id.
        pub comment_id: String,
    }

    impl CommentUpdateMessage {
        pub fn new(action: impl Into<String>, comment_id: impl Into<String>) -> Self {
            Self {
                action: action.into(),
                comment_id: comment_id.into(),
            }
        }
    }
}
