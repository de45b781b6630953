//! User notifications module

mod models;
mod schema;
mod service;
mod sqlite_store;
mod store;

pub use models::{Notification, NotificationPage, NotificationType};
pub use service::NotificationService;
pub use sqlite_store::SqliteNotificationStore;
pub use store::NotificationStore;
