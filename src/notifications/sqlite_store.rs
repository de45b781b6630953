use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

use crate::sqlite_persistence::BASE_DB_VERSION;

use super::models::{Notification, NotificationType};
use super::schema::NOTIFICATIONS_VERSIONED_SCHEMAS;
use super::store::NotificationStore;

pub struct SqliteNotificationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteNotificationStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open notifications database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        if is_new_db {
            info!("Creating new notifications database at {:?}", path);
            NOTIFICATIONS_VERSIONED_SCHEMAS
                .last()
                .unwrap()
                .create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            let schema = NOTIFICATIONS_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version as i64 == db_version)
                .with_context(|| {
                    format!("Unknown notifications database version {}", db_version)
                })?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Notifications database schema validation failed for version {}",
                    db_version
                )
            })?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
        let user_id: i64 = row.get("user_id")?;
        let type_str: String = row.get("notification_type")?;
        let triggered_by: Option<i64> = row.get("triggered_by_user_id")?;
        let is_read: i64 = row.get("is_read")?;

        Ok(Notification {
            id: row.get("id")?,
            user_id: user_id as usize,
            notification_type: NotificationType::parse(&type_str)
                .unwrap_or(NotificationType::Reply),
            title: row.get("title")?,
            message: row.get("message")?,
            comment_id: row.get("comment_id")?,
            triggered_by_user_id: triggered_by.map(|id| id as usize),
            is_read: is_read != 0,
            created_at: row.get("created_at")?,
        })
    }
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, notification_type, title, message, comment_id, \
                                    triggered_by_user_id, is_read, created_at";

impl NotificationStore for SqliteNotificationStore {
    fn create_notification(
        &self,
        user_id: usize,
        notification_type: NotificationType,
        title: String,
        message: String,
        comment_id: Option<String>,
        triggered_by_user_id: Option<usize>,
    ) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            user_id,
            notification_type,
            title,
            message,
            comment_id,
            triggered_by_user_id,
            is_read: false,
            created_at: Utc::now().timestamp(),
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO notifications (id, user_id, notification_type, title, message, \
                                        comment_id, triggered_by_user_id, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
            params![
                notification.id,
                notification.user_id as i64,
                notification.notification_type.as_str(),
                notification.title,
                notification.message,
                notification.comment_id,
                notification.triggered_by_user_id.map(|id| id as i64),
                notification.created_at,
            ],
        )?;

        Ok(notification)
    }

    fn get_user_notifications(
        &self,
        user_id: usize,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Notification>, usize)> {
        let conn = self.conn.lock().unwrap();

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1",
            params![user_id as i64],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notifications WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3",
            NOTIFICATION_COLUMNS
        ))?;
        let notifications = stmt
            .query_map(
                params![user_id as i64, limit as i64, offset as i64],
                Self::row_to_notification,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((notifications, total as usize))
    }

    fn mark_notification_read(
        &self,
        notification_id: &str,
        user_id: usize,
    ) -> Result<Option<Notification>> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
            params![notification_id, user_id as i64],
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notifications WHERE id = ?1 AND user_id = ?2",
            NOTIFICATION_COLUMNS
        ))?;
        let notification = stmt
            .query_row(
                params![notification_id, user_id as i64],
                Self::row_to_notification,
            )
            .optional()?;

        Ok(notification)
    }

    fn mark_all_read(&self, user_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
            params![user_id as i64],
        )?;
        Ok(updated)
    }

    fn get_unread_count(&self, user_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
            params![user_id as i64],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
