//! Notification dispatcher: durable record first, best-effort push second.

use std::sync::Arc;

use tracing::debug;

use crate::server::websocket::{msg_types, ConnectionManager, ServerMessage};

use super::models::{Notification, NotificationPage, NotificationType};
use super::store::NotificationStore;

pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    connection_manager: Arc<ConnectionManager>,
}

impl NotificationService {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        connection_manager: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            store,
            connection_manager,
        }
    }

    /// Persist a notification, then push it to every live connection of the
    /// recipient. A recipient with no connection simply gets nothing pushed;
    /// the stored notification surfaces on their next list call. Push
    /// failures never roll anything back.
    pub async fn create_and_push(
        &self,
        user_id: usize,
        notification_type: NotificationType,
        title: String,
        message: String,
        comment_id: Option<String>,
        triggered_by_user_id: Option<usize>,
    ) -> anyhow::Result<Notification> {
        let notification = self.store.create_notification(
            user_id,
            notification_type,
            title,
            message,
            comment_id,
            triggered_by_user_id,
        )?;

        let ws_msg = ServerMessage::new(msg_types::NOTIFICATION, &notification);
        let failed = self
            .connection_manager
            .broadcast_to_user(user_id, ws_msg)
            .await;
        if !failed.is_empty() {
            debug!(
                "Failed to push notification to {} connections of user {}",
                failed.len(),
                user_id
            );
        }

        Ok(notification)
    }

    /// One page of the user's notifications, newest first, with the total
    /// and the current unread count. Page numbers start at 1.
    pub fn list_for_user(
        &self,
        user_id: usize,
        page: usize,
        limit: usize,
    ) -> anyhow::Result<NotificationPage> {
        let offset = page.max(1).saturating_sub(1) * limit;
        let (notifications, total) = self.store.get_user_notifications(user_id, offset, limit)?;
        let unread_count = self.store.get_unread_count(user_id)?;

        Ok(NotificationPage {
            notifications,
            total,
            unread_count,
        })
    }

    /// Mark one notification read. None when the id does not belong to the
    /// user.
    pub fn mark_read(&self, id: &str, user_id: usize) -> anyhow::Result<Option<Notification>> {
        self.store.mark_notification_read(id, user_id)
    }

    /// Mark all of the user's notifications read. Returns the number flipped.
    pub fn mark_all_read(&self, user_id: usize) -> anyhow::Result<usize> {
        self.store.mark_all_read(user_id)
    }

    pub fn unread_count(&self, user_id: usize) -> anyhow::Result<usize> {
        self.store.get_unread_count(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::sqlite_store::SqliteNotificationStore;
    use tempfile::TempDir;

    struct TestHarness {
        service: NotificationService,
        connection_manager: Arc<ConnectionManager>,
        _temp_dir: TempDir,
    }

    fn create_harness() -> TestHarness {
        let temp_dir = TempDir::new().unwrap();
        let store: Arc<dyn NotificationStore> = Arc::new(
            SqliteNotificationStore::new(temp_dir.path().join("notifications.db")).unwrap(),
        );
        let connection_manager = Arc::new(ConnectionManager::new());
        let service = NotificationService::new(store, connection_manager.clone());
        TestHarness {
            service,
            connection_manager,
            _temp_dir: temp_dir,
        }
    }

    async fn create_reply(service: &NotificationService, user_id: usize) -> Notification {
        service
            .create_and_push(
                user_id,
                NotificationType::Reply,
                "New Reply".to_string(),
                "bob replied to your comment".to_string(),
                Some("comment-1".to_string()),
                Some(2),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_push_delivers_to_connected_recipient() {
        let h = create_harness();
        let (_, mut rx) = h.connection_manager.register(1).await;

        let notification = create_reply(&h.service, 1).await;

        let message = rx.recv().await.unwrap();
        assert_eq!(message.msg_type, msg_types::NOTIFICATION);
        assert_eq!(message.payload["id"], notification.id);
        assert_eq!(message.payload["notification_type"], "reply");
    }

    #[tokio::test]
    async fn create_without_connection_still_persists() {
        let h = create_harness();

        create_reply(&h.service, 1).await;

        let page = h.service.list_for_user(1, 1, 10).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.unread_count, 1);
    }

    #[tokio::test]
    async fn push_is_not_sent_to_other_users() {
        let h = create_harness();
        let (_, mut other_rx) = h.connection_manager.register(2).await;

        create_reply(&h.service, 1).await;

        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_connection_does_not_fail_creation() {
        let h = create_harness();
        let (_, rx) = h.connection_manager.register(1).await;
        drop(rx); // Simulate disconnect without unregister

        let notification = create_reply(&h.service, 1).await;

        // Record is durable regardless of the failed push
        let page = h.service.list_for_user(1, 1, 10).unwrap();
        assert_eq!(page.notifications[0].id, notification.id);
    }

    #[tokio::test]
    async fn mark_read_and_mark_all_read_bookkeeping() {
        let h = create_harness();
        let first = create_reply(&h.service, 1).await;
        create_reply(&h.service, 1).await;
        create_reply(&h.service, 1).await;

        assert_eq!(h.service.unread_count(1).unwrap(), 3);

        let updated = h.service.mark_read(&first.id, 1).unwrap().unwrap();
        assert!(updated.is_read);
        assert_eq!(h.service.unread_count(1).unwrap(), 2);

        assert_eq!(h.service.mark_all_read(1).unwrap(), 2);
        assert_eq!(h.service.unread_count(1).unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_read_for_wrong_user_returns_none() {
        let h = create_harness();
        let notification = create_reply(&h.service, 1).await;

        assert!(h.service.mark_read(&notification.id, 2).unwrap().is_none());
        assert_eq!(h.service.unread_count(1).unwrap(), 1);
    }
}
