use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::sqlite_persistence::BASE_DB_VERSION;

use super::models::Comment;
use super::schema::COMMENTS_VERSIONED_SCHEMAS;
use super::store::CommentStore;

pub struct SqliteCommentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCommentStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open comments database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        if is_new_db {
            info!("Creating new comments database at {:?}", path);
            COMMENTS_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            let schema = COMMENTS_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version as i64 == db_version)
                .with_context(|| format!("Unknown comments database version {}", db_version))?;
            schema
                .validate(&conn)
                .with_context(|| {
                    format!(
                        "Comments database schema validation failed for version {}",
                        db_version
                    )
                })?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
        let author_id: i64 = row.get("author_id")?;
        let is_deleted: i64 = row.get("is_deleted")?;
        let is_edited: i64 = row.get("is_edited")?;

        Ok(Comment {
            id: row.get("id")?,
            content: row.get("content")?,
            author_id: author_id as usize,
            parent_id: row.get("parent_id")?,
            is_deleted: is_deleted != 0,
            deleted_at: row.get("deleted_at")?,
            is_edited: is_edited != 0,
            edited_at: row.get("edited_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            can_edit: false,
            can_delete: false,
            can_restore: false,
            nesting_level: 0,
            children: Vec::new(),
        })
    }
}

const COMMENT_COLUMNS: &str = "id, content, author_id, parent_id, is_deleted, deleted_at, \
                               is_edited, edited_at, created_at, updated_at";

impl CommentStore for SqliteCommentStore {
    fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO comments (id, content, author_id, parent_id, is_deleted, deleted_at, \
                                   is_edited, edited_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                comment.id,
                comment.content,
                comment.author_id as i64,
                comment.parent_id,
                comment.is_deleted as i64,
                comment.deleted_at,
                comment.is_edited as i64,
                comment.edited_at,
                comment.created_at,
                comment.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE id = ?1",
            COMMENT_COLUMNS
        ))?;

        let comment = stmt
            .query_row(params![id], Self::row_to_comment)
            .optional()?;

        Ok(comment)
    }

    fn get_comment_with_replies(&self, id: &str) -> Result<Option<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE id = ?1",
            COMMENT_COLUMNS
        ))?;

        let comment = stmt
            .query_row(params![id], Self::row_to_comment)
            .optional()?;

        let mut comment = match comment {
            Some(c) => c,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments WHERE parent_id = ?1 ORDER BY created_at ASC, rowid ASC",
            COMMENT_COLUMNS
        ))?;
        comment.children = stmt
            .query_map(params![id], Self::row_to_comment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(comment))
    }

    fn find_page(&self, offset: usize, limit: usize) -> Result<(Vec<Comment>, usize)> {
        let conn = self.conn.lock().unwrap();

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM comments ORDER BY created_at ASC, rowid ASC LIMIT ?1 OFFSET ?2",
            COMMENT_COLUMNS
        ))?;
        let comments = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_comment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((comments, total as usize))
    }

    fn update_content(&self, id: &str, content: &str, edited_at: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE comments SET content = ?1, is_edited = 1, edited_at = ?2, updated_at = ?2
             WHERE id = ?3",
            params![content, edited_at, id],
        )?;
        Ok(())
    }

    fn set_deleted(&self, id: &str, deleted_at: Option<i64>, updated_at: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE comments SET is_deleted = ?1, deleted_at = ?2, updated_at = ?3 WHERE id = ?4",
            params![deleted_at.is_some() as i64, deleted_at, updated_at, id],
        )?;
        Ok(())
    }

    fn count_comments(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
