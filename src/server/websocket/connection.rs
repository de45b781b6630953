//! WebSocket connection manager.
//!
//! Process-wide registry of live connections, organized by user. A user can
//! hold any number of concurrent connections (several tabs, several devices);
//! each gets a server-assigned connection id on register. Sends are
//! best-effort: a closed channel counts as a failed delivery and nothing
//! more.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, RwLock};

use super::messages::ServerMessage;

/// Error type for send operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SendError {
    /// The target connection is not registered.
    NotConnected,
    /// The connection channel is closed (client went away).
    Disconnected,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    /// user_id -> (connection_id -> outgoing sender)
    connections: RwLock<HashMap<usize, HashMap<usize, mpsc::Sender<ServerMessage>>>>,
    next_connection_id: AtomicUsize,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_connection_id: AtomicUsize::new(1),
        }
    }

    /// Register a new connection for a user.
    ///
    /// Returns the assigned connection id and a receiver for outgoing
    /// messages. The caller forwards messages from this receiver to the
    /// WebSocket.
    pub async fn register(&self, user_id: usize) -> (usize, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(32);
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);

        let mut conns = self.connections.write().await;
        conns.entry(user_id).or_default().insert(connection_id, tx);

        (connection_id, rx)
    }

    /// Unregister a connection (called on disconnect).
    ///
    /// Removes the connection entry and cleans up empty user maps.
    pub async fn unregister(&self, user_id: usize, connection_id: usize) {
        let mut conns = self.connections.write().await;
        if let Some(user_conns) = conns.get_mut(&user_id) {
            user_conns.remove(&connection_id);
            if user_conns.is_empty() {
                conns.remove(&user_id);
            }
        }
    }

    /// Send a message to one specific connection.
    pub async fn send_to_connection(
        &self,
        user_id: usize,
        connection_id: usize,
        message: ServerMessage,
    ) -> Result<(), SendError> {
        let conns = self.connections.read().await;
        if let Some(user_conns) = conns.get(&user_id) {
            if let Some(sender) = user_conns.get(&connection_id) {
                sender
                    .send(message)
                    .await
                    .map_err(|_| SendError::Disconnected)?;
                return Ok(());
            }
        }
        Err(SendError::NotConnected)
    }

    /// Send a message to ALL connections of a user.
    ///
    /// Returns the connection ids that failed (disconnected). A user with no
    /// live connection fails nothing; the message is simply dropped.
    pub async fn broadcast_to_user(&self, user_id: usize, message: ServerMessage) -> Vec<usize> {
        let conns = self.connections.read().await;
        let mut failed = Vec::new();

        if let Some(user_conns) = conns.get(&user_id) {
            for (connection_id, sender) in user_conns.iter() {
                if sender.send(message.clone()).await.is_err() {
                    failed.push(*connection_id);
                }
            }
        }

        failed
    }

    /// Broadcast a message to every connection of every user.
    ///
    /// Used for signals all clients care about, like comment list updates.
    /// Returns count of failed sends.
    pub async fn broadcast_to_all(&self, message: ServerMessage) -> usize {
        let conns = self.connections.read().await;
        let mut failed_count = 0;

        for user_conns in conns.values() {
            for sender in user_conns.values() {
                if sender.send(message.clone()).await.is_err() {
                    failed_count += 1;
                }
            }
        }

        failed_count
    }

    /// Check whether a user has at least one live connection.
    pub async fn is_user_connected(&self, user_id: usize) -> bool {
        let conns = self.connections.read().await;
        conns.contains_key(&user_id)
    }

    /// Number of live connections for a user.
    pub async fn connection_count(&self, user_id: usize) -> usize {
        let conns = self.connections.read().await;
        conns
            .get(&user_id)
            .map(|user_conns| user_conns.len())
            .unwrap_or(0)
    }

    /// Total number of live connections across all users.
    pub async fn total_connections(&self) -> usize {
        let conns = self.connections.read().await;
        conns.values().map(|user_conns| user_conns.len()).sum()
    }
}
