//! SQLite schema definitions for the comments database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const PARENT_COMMENT_FK: ForeignKey = ForeignKey {
    foreign_table: "comments",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::NoAction,
};

/// Comments table. Soft deletes keep the row (and its content) around so the
/// restore window can bring it back intact.
const COMMENTS_TABLE_V1: Table = Table {
    name: "comments",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true), // UUID
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!("author_id", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "parent_id",
            &SqlType::Text,
            foreign_key = Some(&PARENT_COMMENT_FK)
        ),
        sqlite_column!(
            "is_deleted",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("deleted_at", &SqlType::Integer),
        sqlite_column!(
            "is_edited",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("edited_at", &SqlType::Integer),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_comments_parent_id", "parent_id"),
        ("idx_comments_author_id", "author_id"),
        ("idx_comments_created_at", "created_at"),
    ],
};

/// All versioned schemas for the comments database.
pub const COMMENTS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[COMMENTS_TABLE_V1],
    migration: None, // Initial version has no migration
}];
