//! Notification storage trait

use anyhow::Result;

use super::models::{Notification, NotificationType};

/// Trait for notification storage operations
pub trait NotificationStore: Send + Sync {
    /// Create a notification for a user.
    /// Returns the created notification with its id and timestamp set.
    fn create_notification(
        &self,
        user_id: usize,
        notification_type: NotificationType,
        title: String,
        message: String,
        comment_id: Option<String>,
        triggered_by_user_id: Option<usize>,
    ) -> Result<Notification>;

    /// Get one page of a user's notifications ordered by created_at DESC,
    /// together with the user's total notification count.
    fn get_user_notifications(
        &self,
        user_id: usize,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Notification>, usize)>;

    /// Mark a notification as read. Returns the updated notification, or
    /// None when no notification with that id belongs to the user. Idempotent.
    fn mark_notification_read(
        &self,
        notification_id: &str,
        user_id: usize,
    ) -> Result<Option<Notification>>;

    /// Mark every unread notification of the user as read. Returns the
    /// number of rows flipped.
    fn mark_all_read(&self, user_id: usize) -> Result<usize>;

    /// Get count of unread notifications for a user.
    fn get_unread_count(&self, user_id: usize) -> Result<usize>;
}
