//! Comment data models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long after posting a comment its author may still edit it.
pub const EDIT_GRACE_PERIOD_SECS: i64 = 15 * 60;

/// How long after deletion a comment may still be restored by its author.
pub const DELETE_GRACE_PERIOD_SECS: i64 = 15 * 60;

/// Upper bound on comment content length, in characters.
pub const MAX_CONTENT_LENGTH: usize = 1000;

/// Server-side cap on reply nesting. Roots sit at level 0.
pub const MAX_NESTING_DEPTH: usize = 32;

/// A threaded comment.
///
/// The permission flags, `nesting_level` and `children` are derived at read
/// time and never stored; a comment coming straight out of the store has them
/// at their defaults until it passes through annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_id: usize,
    pub parent_id: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
    pub is_edited: bool,
    pub edited_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,

    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub can_restore: bool,
    #[serde(default)]
    pub nesting_level: usize,
    #[serde(default)]
    pub children: Vec<Comment>,
}

impl Comment {
    /// Create a fresh comment with a random id and the given timestamp.
    pub fn new(
        content: impl Into<String>,
        author_id: usize,
        parent_id: Option<String>,
        now: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            author_id,
            parent_id,
            is_deleted: false,
            deleted_at: None,
            is_edited: false,
            edited_at: None,
            created_at: now,
            updated_at: now,
            can_edit: false,
            can_delete: false,
            can_restore: false,
            nesting_level: 0,
            children: Vec::new(),
        }
    }

    /// Compute the time-windowed permission flags against `now` and assign
    /// the nesting level. Flags are always computed freshly at read time, so
    /// they can never go stale in storage.
    pub fn apply_permission_flags(&mut self, now: i64, nesting_level: usize) {
        let age = now - self.created_at;
        let delete_age = self.deleted_at.map(|d| now - d).unwrap_or(0);

        self.can_edit = !self.is_deleted && age <= EDIT_GRACE_PERIOD_SECS;
        self.can_delete = !self.is_deleted;
        self.can_restore = self.is_deleted && delete_age <= DELETE_GRACE_PERIOD_SECS;
        self.nesting_level = nesting_level;
    }
}

/// One page of comments, assembled into a forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub total: usize,
}
