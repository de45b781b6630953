//! Parlor Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod comments;
pub mod config;
pub mod notifications;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use comments::{CommentService, CommentStore, SqliteCommentStore};
pub use notifications::{NotificationService, NotificationStore, SqliteNotificationStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserStore};
