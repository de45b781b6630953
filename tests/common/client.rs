//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. When API routes or
//! request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// The session token returned by the last successful login
    pub token: Option<String>,
}

impl TestClient {
    /// Creates a new unauthenticated client.
    ///
    /// Use this for testing authentication flows. For most tests, use
    /// `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Creates a client pre-authenticated as the regular test user.
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client pre-authenticated as the second test user.
    pub async fn authenticated_other(base_url: String) -> Self {
        Self::authenticated_as(base_url, OTHER_USER, OTHER_PASS).await
    }

    /// Creates a client pre-authenticated as a specific user.
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated_as(base_url: String, handle: &str, password: &str) -> Self {
        let mut client = Self::new(base_url);

        let response = client.login(handle, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user authentication failed",
        );

        // Capture the token for header-based auth (e.g. WebSocket tests);
        // the cookie store handles everything else.
        let body: serde_json::Value = response.json().await.expect("Login body not JSON");
        client.token = body["token"].as_str().map(|s| s.to_string());

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "user_handle": handle,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // Comment Endpoints
    // ========================================================================

    /// POST /v1/comments
    pub async fn create_comment(&self, content: &str, parent_id: Option<&str>) -> Response {
        self.client
            .post(format!("{}/v1/comments", self.base_url))
            .json(&json!({
                "content": content,
                "parent_id": parent_id,
            }))
            .send()
            .await
            .expect("Create comment request failed")
    }

    /// GET /v1/comments?page=..&limit=..
    pub async fn list_comments(&self, page: usize, limit: usize) -> Response {
        self.client
            .get(format!(
                "{}/v1/comments?page={}&limit={}",
                self.base_url, page, limit
            ))
            .send()
            .await
            .expect("List comments request failed")
    }

    /// GET /v1/comments/{id}
    pub async fn get_comment(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/comments/{}", self.base_url, id))
            .send()
            .await
            .expect("Get comment request failed")
    }

    /// PUT /v1/comments/{id}
    pub async fn update_comment(&self, id: &str, content: &str) -> Response {
        self.client
            .put(format!("{}/v1/comments/{}", self.base_url, id))
            .json(&json!({ "content": content }))
            .send()
            .await
            .expect("Update comment request failed")
    }

    /// DELETE /v1/comments/{id}
    pub async fn delete_comment(&self, id: &str) -> Response {
        self.client
            .delete(format!("{}/v1/comments/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete comment request failed")
    }

    /// PUT /v1/comments/{id}/restore
    pub async fn restore_comment(&self, id: &str) -> Response {
        self.client
            .put(format!("{}/v1/comments/{}/restore", self.base_url, id))
            .send()
            .await
            .expect("Restore comment request failed")
    }

    // ========================================================================
    // Notification Endpoints
    // ========================================================================

    /// GET /v1/notifications?page=..&limit=..
    pub async fn list_notifications(&self, page: usize, limit: usize) -> Response {
        self.client
            .get(format!(
                "{}/v1/notifications?page={}&limit={}",
                self.base_url, page, limit
            ))
            .send()
            .await
            .expect("List notifications request failed")
    }

    /// GET /v1/notifications/unread-count
    pub async fn unread_count(&self) -> Response {
        self.client
            .get(format!("{}/v1/notifications/unread-count", self.base_url))
            .send()
            .await
            .expect("Unread count request failed")
    }

    /// PUT /v1/notifications/{id}/read
    pub async fn mark_notification_read(&self, id: &str) -> Response {
        self.client
            .put(format!("{}/v1/notifications/{}/read", self.base_url, id))
            .send()
            .await
            .expect("Mark notification read request failed")
    }

    /// PUT /v1/notifications/read-all
    pub async fn mark_all_notifications_read(&self) -> Response {
        self.client
            .put(format!("{}/v1/notifications/read-all", self.base_url))
            .send()
            .await
            .expect("Mark all notifications read request failed")
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Create a comment and return its parsed body, asserting success.
    pub async fn create_comment_ok(
        &self,
        content: &str,
        parent_id: Option<&str>,
    ) -> serde_json::Value {
        let response = self.create_comment(content, parent_id).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Create comment failed: {:?}",
            response.text().await
        );
        response.json().await.expect("Comment body not JSON")
    }

    /// WebSocket endpoint URL for this server.
    pub fn ws_url(&self) -> String {
        format!(
            "{}/v1/ws",
            self.base_url.replace("http://", "ws://")
        )
    }
}
