//! Threaded comments: lifecycle engine, tree building, page cache.

mod cache;
mod models;
mod schema;
mod service;
mod sqlite_store;
mod store;
pub mod tree;

pub use cache::{CommentPageCache, InMemoryPageCache, DEFAULT_PAGE_CACHE_TTL};
pub use models::{
    Comment, CommentPage, DELETE_GRACE_PERIOD_SECS, EDIT_GRACE_PERIOD_SECS, MAX_CONTENT_LENGTH,
    MAX_NESTING_DEPTH,
};
pub use service::{CommentError, CommentService};
pub use sqlite_store::SqliteCommentStore;
pub use store::CommentStore;
