//! Users and session tokens: the identity boundary the core trusts.

pub mod auth;
mod schema;
mod sqlite_user_store;
mod user_store;

pub use auth::{hash_password, AuthToken, AuthTokenValue, ParlorHasher, PasswordCredentials};
pub use sqlite_user_store::SqliteUserStore;
pub use user_store::UserStore;
