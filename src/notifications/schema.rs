//! SQLite schema definitions for the notifications database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const NOTIFICATIONS_TABLE_V1: Table = Table {
    name: "notifications",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true), // UUID
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!("notification_type", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("message", &SqlType::Text, non_null = true),
        sqlite_column!("comment_id", &SqlType::Text),
        sqlite_column!("triggered_by_user_id", &SqlType::Integer),
        sqlite_column!(
            "is_read",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_notifications_user_read", "user_id, is_read"),
        ("idx_notifications_created_at", "created_at"),
    ],
};

/// All versioned schemas for the notifications database.
pub const NOTIFICATIONS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[NOTIFICATIONS_TABLE_V1],
    migration: None, // Initial version has no migration
}];
