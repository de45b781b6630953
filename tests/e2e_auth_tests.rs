//! End-to-end tests for the auth boundary

mod common;

use common::{TestClient, TestServer, TEST_PASS, TEST_USER};
use reqwest::StatusCode;

#[tokio::test]
async fn login_with_valid_credentials_returns_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);
}

#[tokio::test]
async fn login_with_wrong_password_is_forbidden() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(TEST_USER, "not-the-password").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_with_unknown_user_is_forbidden() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login("nobody", "whatever").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn session_cookie_authenticates_requests() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.create_comment("hello", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn authorization_header_authenticates_requests() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let token = client.token.clone().unwrap();

    // A fresh client without a cookie store, using the raw token
    let bare = reqwest::Client::new();
    let response = bare
        .post(format!("{}/v1/comments", server.base_url))
        .header("Authorization", token)
        .json(&serde_json::json!({ "content": "via header", "parent_id": null }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn home_reports_session_token_when_authenticated() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client
        .client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["session_token"].as_str(), client.token.as_deref());
    assert!(body["uptime"].as_str().is_some());
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    assert_eq!(
        client.create_comment("pre-logout", None).await.status(),
        StatusCode::CREATED
    );

    let response = client.logout().await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.create_comment("post-logout", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_invalidates_the_token_server_side() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let token = client.token.clone().unwrap();

    client.logout().await;

    // The old token is gone even when presented via header
    let bare = reqwest::Client::new();
    let response = bare
        .post(format!("{}/v1/comments", server.base_url))
        .header("Authorization", token)
        .json(&serde_json::json!({ "content": "stale token", "parent_id": null }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
