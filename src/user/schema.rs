//! SQLite schema definitions for the users database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const USERS_TABLE_V1: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true), // AUTOINCREMENT
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("password_salt", &SqlType::Text, non_null = true),
        sqlite_column!("password_hash", &SqlType::Text, non_null = true),
        sqlite_column!("password_hasher", &SqlType::Text, non_null = true),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
};

const AUTH_TOKEN_USER_FK: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const AUTH_TOKENS_TABLE_V1: Table = Table {
    name: "auth_tokens",
    columns: &[
        sqlite_column!("value", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&AUTH_TOKEN_USER_FK)
        ),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!("last_used_at", &SqlType::Integer),
    ],
    indices: &[("idx_auth_tokens_user_id", "user_id")],
};

/// All versioned schemas for the users database.
pub const USERS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[USERS_TABLE_V1, AUTH_TOKENS_TABLE_V1],
    migration: None, // Initial version has no migration
}];
