//! Notification data models

use serde::{Deserialize, Serialize};

/// Notification type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Reply,
    Mention,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Reply => "reply",
            NotificationType::Mention => "mention",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reply" => Some(NotificationType::Reply),
            "mention" => Some(NotificationType::Mention),
            _ => None,
        }
    }
}

/// A user notification. Created only as a side effect of a comment mutation;
/// the only mutation it ever sees is being marked read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: usize,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub comment_id: Option<String>,
    pub triggered_by_user_id: Option<usize>,
    pub is_read: bool,
    pub created_at: i64,
}

/// One page of a user's notifications, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: usize,
    pub unread_count: usize,
}
