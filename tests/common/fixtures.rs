//! Test fixture creation: temp databases pre-populated with test users.

use super::constants::*;
use anyhow::Result;
use parlor_server::user::{hash_password, SqliteUserStore, UserStore};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestDbPaths {
    pub comments_db: PathBuf,
    pub notifications_db: PathBuf,
    pub users_db: PathBuf,
}

/// Creates a temp directory holding the three store databases, with the two
/// test users already provisioned.
pub fn create_test_databases() -> Result<(TempDir, TestDbPaths)> {
    let dir = TempDir::new()?;

    let paths = TestDbPaths {
        comments_db: dir.path().join("comments.db"),
        notifications_db: dir.path().join("notifications.db"),
        users_db: dir.path().join("users.db"),
    };

    let user_store = SqliteUserStore::new(&paths.users_db)?;
    user_store.create_user(TEST_USER, &hash_password(TEST_PASS)?)?;
    user_store.create_user(OTHER_USER, &hash_password(OTHER_PASS)?)?;

    Ok((dir, paths))
}
