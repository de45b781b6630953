use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::sqlite_persistence::BASE_DB_VERSION;

use super::auth::{AuthToken, AuthTokenValue, ParlorHasher, PasswordCredentials, UserCredentials};
use super::schema::USERS_VERSIONED_SCHEMAS;
use super::user_store::UserStore;

pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open users database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        if is_new_db {
            info!("Creating new users database at {:?}", path);
            USERS_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            let schema = USERS_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version as i64 == db_version)
                .with_context(|| format!("Unknown users database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Users database schema validation failed for version {}",
                    db_version
                )
            })?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_auth_token(row: &rusqlite::Row) -> rusqlite::Result<AuthToken> {
        let user_id: i64 = row.get("user_id")?;
        Ok(AuthToken {
            user_id: user_id as usize,
            created_at: row.get("created_at")?,
            last_used_at: row.get("last_used_at")?,
            value: AuthTokenValue(row.get("value")?),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, handle: &str, credentials: &PasswordCredentials) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (handle, password_salt, password_hash, password_hasher, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                handle,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
                Utc::now().timestamp(),
            ],
        )
        .with_context(|| format!("Failed to create user '{}'", handle))?;

        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_id(&self, handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE handle = ?1",
                params![handle],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|id| id as usize))
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let handle: Option<String> = conn
            .query_row(
                "SELECT handle FROM users WHERE id = ?1",
                params![user_id as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(handle)
    }

    fn get_all_user_handles(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT handle FROM users ORDER BY id")?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(handles)
    }

    fn get_user_credentials(&self, handle: &str) -> Result<Option<UserCredentials>> {
        let conn = self.conn.lock().unwrap();
        let row: Option<(i64, String, String, String)> = conn
            .query_row(
                "SELECT id, password_salt, password_hash, password_hasher
                 FROM users WHERE handle = ?1",
                params![handle],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some((user_id, salt, hash, hasher_name)) => Ok(Some(UserCredentials {
                user_id: user_id as usize,
                salt,
                hash,
                hasher: ParlorHasher::from_str(&hasher_name)?,
            })),
            None => Ok(None),
        }
    }

    fn add_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO auth_tokens (value, user_id, created_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token.value.0,
                token.user_id as i64,
                token.created_at,
                token.last_used_at,
            ],
        )?;
        Ok(())
    }

    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT value, user_id, created_at, last_used_at FROM auth_tokens WHERE value = ?1",
        )?;
        let token = stmt
            .query_row(params![value.0], Self::row_to_auth_token)
            .optional()?;
        Ok(token)
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT value, user_id, created_at, last_used_at FROM auth_tokens WHERE value = ?1",
        )?;
        let token = stmt
            .query_row(params![value.0], Self::row_to_auth_token)
            .optional()?;

        if token.is_some() {
            conn.execute(
                "DELETE FROM auth_tokens WHERE value = ?1",
                params![value.0],
            )?;
        }

        Ok(token)
    }

    fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE auth_tokens SET last_used_at = ?1 WHERE value = ?2",
            params![Utc::now().timestamp(), value.0],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::auth::hash_password;
    use tempfile::TempDir;

    struct TestStore {
        store: SqliteUserStore,
        _temp_dir: TempDir, // Keep temp dir alive
    }

    fn create_test_store() -> TestStore {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("users.db");
        let store = SqliteUserStore::new(&db_path).unwrap();
        TestStore {
            store,
            _temp_dir: temp_dir,
        }
    }

    #[test]
    fn create_user_and_resolve_both_ways() {
        let test = create_test_store();
        let store = &test.store;

        let credentials = hash_password("secret").unwrap();
        let user_id = store.create_user("alice", &credentials).unwrap();

        assert_eq!(store.get_user_id("alice").unwrap(), Some(user_id));
        assert_eq!(
            store.get_user_handle(user_id).unwrap(),
            Some("alice".to_string())
        );
        assert!(store.get_user_id("nobody").unwrap().is_none());
        assert!(store.get_user_handle(999).unwrap().is_none());
    }

    #[test]
    fn duplicate_handle_fails() {
        let test = create_test_store();
        let store = &test.store;

        let credentials = hash_password("secret").unwrap();
        store.create_user("alice", &credentials).unwrap();
        assert!(store.create_user("alice", &credentials).is_err());
    }

    #[test]
    fn stored_credentials_verify_password() {
        let test = create_test_store();
        let store = &test.store;

        let credentials = hash_password("hunter2").unwrap();
        let user_id = store.create_user("alice", &credentials).unwrap();

        let stored = store.get_user_credentials("alice").unwrap().unwrap();
        assert_eq!(stored.user_id, user_id);
        assert!(stored.verify("hunter2").unwrap());
        assert!(!stored.verify("wrong").unwrap());

        assert!(store.get_user_credentials("nobody").unwrap().is_none());
    }

    #[test]
    fn get_all_user_handles_in_creation_order() {
        let test = create_test_store();
        let store = &test.store;

        let credentials = hash_password("pw").unwrap();
        store.create_user("alice", &credentials).unwrap();
        store.create_user("bob", &credentials).unwrap();

        assert_eq!(store.get_all_user_handles().unwrap(), vec!["alice", "bob"]);
    }

    #[test]
    fn auth_token_lifecycle() {
        let test = create_test_store();
        let store = &test.store;

        let credentials = hash_password("pw").unwrap();
        let user_id = store.create_user("alice", &credentials).unwrap();

        let token = AuthToken {
            user_id,
            created_at: 1000,
            last_used_at: None,
            value: AuthTokenValue::generate(),
        };
        store.add_auth_token(&token).unwrap();

        let fetched = store.get_auth_token(&token.value).unwrap().unwrap();
        assert_eq!(fetched.user_id, user_id);
        assert!(fetched.last_used_at.is_none());

        store.update_auth_token_last_used(&token.value).unwrap();
        let fetched = store.get_auth_token(&token.value).unwrap().unwrap();
        assert!(fetched.last_used_at.is_some());

        let deleted = store.delete_auth_token(&token.value).unwrap();
        assert!(deleted.is_some());
        assert!(store.get_auth_token(&token.value).unwrap().is_none());

        // Deleting again is a no-op
        assert!(store.delete_auth_token(&token.value).unwrap().is_none());
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let test = create_test_store();
        let value = AuthTokenValue("not-a-token".to_string());
        assert!(test.store.get_auth_token(&value).unwrap().is_none());
    }
}
