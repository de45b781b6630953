use anyhow::Result;

use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials, UserCredentials};

/// Trait for user and session token storage.
///
/// The core trusts the user id this layer resolves from a session token; it
/// never re-derives identity anywhere else.
pub trait UserStore: Send + Sync {
    /// Creates a new user and returns the user id.
    /// Fails if the handle is already taken.
    fn create_user(&self, handle: &str, credentials: &PasswordCredentials) -> Result<usize>;

    /// Returns a user's id given the handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, handle: &str) -> Result<Option<usize>>;

    /// Returns a user's handle given the user id.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;

    /// Returns all users' handles.
    fn get_all_user_handles(&self) -> Result<Vec<String>>;

    /// Returns the stored credentials for a handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_credentials(&self, handle: &str) -> Result<Option<UserCredentials>>;

    /// Adds a new session token.
    fn add_auth_token(&self, token: &AuthToken) -> Result<()>;

    /// Returns the session token record for a token value.
    /// Returns Ok(None) if the token does not exist.
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes a session token, returning the deleted record if it existed.
    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Stamps a session token with the current time.
    fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()>;
}
