//! Comment storage trait

use anyhow::Result;

use super::models::Comment;

/// Trait for comment storage operations.
///
/// Mutations are single atomic statements at the store layer; the lifecycle
/// engine never does read-then-write against the same row.
pub trait CommentStore: Send + Sync {
    /// Persist a new comment.
    fn insert_comment(&self, comment: &Comment) -> Result<()>;

    /// Get a single comment by id, without children.
    fn get_comment(&self, id: &str) -> Result<Option<Comment>>;

    /// Get a comment with its direct replies populated (one level,
    /// creation order).
    fn get_comment_with_replies(&self, id: &str) -> Result<Option<Comment>>;

    /// Fetch one flat page window ordered by creation time ascending,
    /// together with the total comment count.
    fn find_page(&self, offset: usize, limit: usize) -> Result<(Vec<Comment>, usize)>;

    /// Replace a comment's content and mark it edited.
    fn update_content(&self, id: &str, content: &str, edited_at: i64) -> Result<()>;

    /// Set or clear the soft-delete tombstone. `deleted_at = Some(ts)`
    /// deletes, `None` restores. Content is retained either way.
    fn set_deleted(&self, id: &str, deleted_at: Option<i64>, updated_at: i64) -> Result<()>;

    /// Total number of comments, tombstones included.
    fn count_comments(&self) -> Result<usize>;
}
