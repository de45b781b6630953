//! Comment lifecycle engine.
//!
//! Owns every comment mutation: create/edit/delete/restore with their
//! time-windowed permission checks, cache invalidation, and the reply
//! notification side effect. Reads assemble and annotate the stored rows into
//! the shape callers see.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use crate::notifications::{NotificationService, NotificationType};
use crate::user::UserStore;

use super::cache::CommentPageCache;
use super::models::{
    Comment, CommentPage, DELETE_GRACE_PERIOD_SECS, EDIT_GRACE_PERIOD_SECS, MAX_CONTENT_LENGTH,
    MAX_NESTING_DEPTH,
};
use super::store::CommentStore;
use super::tree;

/// Typed failures of the comment lifecycle. Cache and push problems never
/// show up here; they are swallowed where they happen.
#[derive(Debug, Error)]
pub enum CommentError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct CommentService {
    store: Arc<dyn CommentStore>,
    user_store: Arc<dyn UserStore>,
    cache: Arc<dyn CommentPageCache>,
    notifications: Arc<NotificationService>,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn CommentStore>,
        user_store: Arc<dyn UserStore>,
        cache: Arc<dyn CommentPageCache>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            store,
            user_store,
            cache,
            notifications,
        }
    }

    /// Create a comment, optionally as a reply.
    ///
    /// Replying to someone else's comment persists and pushes a reply
    /// notification to the parent's author. Notification or push failure
    /// never rolls back the created comment.
    pub async fn create(
        &self,
        content: &str,
        author_id: usize,
        parent_id: Option<String>,
    ) -> Result<Comment, CommentError> {
        validate_content(content)?;

        let mut notify_author: Option<usize> = None;
        if let Some(parent_id) = &parent_id {
            let parent = self
                .store
                .get_comment(parent_id)?
                .ok_or(CommentError::NotFound("Parent comment not found"))?;

            if parent.is_deleted {
                return Err(CommentError::InvalidState("Cannot reply to deleted comment"));
            }

            if self.reply_level(&parent)? >= MAX_NESTING_DEPTH {
                return Err(CommentError::InvalidState("Maximum reply depth reached"));
            }

            if parent.author_id != author_id {
                notify_author = Some(parent.author_id);
            }
        }

        let now = Utc::now().timestamp();
        let comment = Comment::new(content, author_id, parent_id.clone(), now);
        self.store.insert_comment(&comment)?;

        self.cache.reset();

        if let Some(recipient) = notify_author {
            let handle = self
                .user_store
                .get_user_handle(author_id)
                .unwrap_or_default()
                .unwrap_or_else(|| "Someone".to_string());

            let result = self
                .notifications
                .create_and_push(
                    recipient,
                    NotificationType::Reply,
                    "New Reply".to_string(),
                    format!("{} replied to your comment", handle),
                    parent_id,
                    Some(author_id),
                )
                .await;
            if let Err(err) = result {
                // The comment itself is already durable; losing the
                // notification is an accepted partial failure.
                warn!("Failed to create reply notification: {}", err);
            }
        }

        self.get(&comment.id)
    }

    /// Edit a comment's content. Only the author, only while the comment is
    /// not deleted, and only within the edit grace window.
    pub fn update(
        &self,
        id: &str,
        content: &str,
        requester_id: usize,
    ) -> Result<Comment, CommentError> {
        validate_content(content)?;

        let comment = self
            .store
            .get_comment(id)?
            .ok_or(CommentError::NotFound("Comment not found"))?;

        if comment.author_id != requester_id {
            return Err(CommentError::Forbidden("You can only edit your own comments"));
        }
        if comment.is_deleted {
            return Err(CommentError::InvalidState("Cannot edit deleted comment"));
        }

        let now = Utc::now().timestamp();
        if now - comment.created_at > EDIT_GRACE_PERIOD_SECS {
            return Err(CommentError::Forbidden(
                "Comment can only be edited within 15 minutes of posting",
            ));
        }

        self.store.update_content(id, content, now)?;
        self.cache.reset();

        self.get(id)
    }

    /// Soft-delete a comment. The row and its content are retained so the
    /// restore window can bring it back.
    pub fn delete(&self, id: &str, requester_id: usize) -> Result<(), CommentError> {
        let comment = self
            .store
            .get_comment(id)?
            .ok_or(CommentError::NotFound("Comment not found"))?;

        if comment.author_id != requester_id {
            return Err(CommentError::Forbidden(
                "You can only delete your own comments",
            ));
        }
        if comment.is_deleted {
            return Err(CommentError::InvalidState("Comment is already deleted"));
        }

        let now = Utc::now().timestamp();
        self.store.set_deleted(id, Some(now), now)?;
        self.cache.reset();

        Ok(())
    }

    /// Restore a soft-deleted comment within the restore grace window.
    pub fn restore(&self, id: &str, requester_id: usize) -> Result<Comment, CommentError> {
        let comment = self
            .store
            .get_comment(id)?
            .ok_or(CommentError::NotFound("Comment not found"))?;

        if comment.author_id != requester_id {
            return Err(CommentError::Forbidden(
                "You can only restore your own comments",
            ));
        }
        if !comment.is_deleted {
            return Err(CommentError::InvalidState("Comment is not deleted"));
        }

        let deleted_at = comment
            .deleted_at
            .ok_or_else(|| anyhow!("deleted comment {} has no deleted_at", id))?;

        let now = Utc::now().timestamp();
        if now - deleted_at > DELETE_GRACE_PERIOD_SECS {
            return Err(CommentError::Forbidden(
                "Comment can only be restored within 15 minutes of deletion",
            ));
        }

        self.store.set_deleted(id, None, now)?;
        self.cache.reset();

        self.get(id)
    }

    /// Get a comment with its direct replies, annotated with nesting level 0
    /// for the fetched node.
    pub fn get(&self, id: &str) -> Result<Comment, CommentError> {
        let mut comment = self
            .store
            .get_comment_with_replies(id)?
            .ok_or(CommentError::NotFound("Comment not found"))?;

        let now = Utc::now().timestamp();
        tree::annotate_forest(std::slice::from_mut(&mut comment), now);

        Ok(comment)
    }

    /// List one page of comments as an annotated forest, memoized for the
    /// cache TTL. Page numbers start at 1.
    pub fn list(&self, page: usize, limit: usize) -> Result<CommentPage, CommentError> {
        let page = page.max(1);

        if let Some(cached) = self.cache.get(page, limit) {
            return Ok(cached);
        }

        let offset = (page - 1) * limit;
        let (flat, total) = self.store.find_page(offset, limit)?;

        let mut comments = tree::build_forest(flat);
        tree::annotate_forest(&mut comments, Utc::now().timestamp());

        let result = CommentPage { comments, total };
        self.cache.set(page, limit, result.clone());

        Ok(result)
    }

    /// Nesting level a new reply to `parent` would occupy. Walks the parent
    /// chain; the walk is bounded by the depth cap itself.
    fn reply_level(&self, parent: &Comment) -> Result<usize, CommentError> {
        let mut level = 1;
        let mut current = parent.parent_id.clone();
        while let Some(id) = current {
            level += 1;
            if level >= MAX_NESTING_DEPTH {
                break;
            }
            current = self.store.get_comment(&id)?.and_then(|c| c.parent_id);
        }
        Ok(level)
    }
}

fn validate_content(content: &str) -> Result<(), CommentError> {
    if content.is_empty() {
        return Err(CommentError::Validation(
            "Comment content must not be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(CommentError::Validation(format!(
            "Comment content must not exceed {} characters",
            MAX_CONTENT_LENGTH
        )));
    }
    Ok(())
}
