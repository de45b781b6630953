use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tracing::{error, info};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use crate::comments::{
    CommentError, CommentService, CommentStore, InMemoryPageCache,
};
use crate::notifications::{NotificationService, NotificationStore};
use crate::user::{AuthToken, AuthTokenValue, UserStore};

use super::metrics::{record_comment_mutation, record_login_attempt};
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::state::*;
use super::websocket::{comments as ws_comments, msg_types, ws_handler, ConnectionManager, ServerMessage};
use super::{log_requests, ServerConfig};

impl IntoResponse for CommentError {
    fn into_response(self) -> Response {
        let status = match &self {
            CommentError::NotFound(_) => StatusCode::NOT_FOUND,
            CommentError::Forbidden(_) => StatusCode::FORBIDDEN,
            CommentError::InvalidState(_) | CommentError::Validation(_) => StatusCode::BAD_REQUEST,
            CommentError::Internal(err) => {
                // Store failures surface as a generic unavailability signal,
                // never as NotFound
                error!("Internal error: {:#}", err);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response();
            }
        };
        (status, self.to_string()).into_response()
    }
}

fn internal_error(err: anyhow::Error) -> Response {
    error!("Internal error: {:#}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Response {
    let credentials = match state.user_store.get_user_credentials(&body.user_handle) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            record_login_attempt(false);
            return StatusCode::FORBIDDEN.into_response();
        }
        Err(err) => return internal_error(err),
    };

    match credentials.verify(&body.password) {
        Ok(true) => {}
        Ok(false) => {
            record_login_attempt(false);
            return StatusCode::FORBIDDEN.into_response();
        }
        Err(err) => return internal_error(err),
    }

    let token = AuthToken {
        user_id: credentials.user_id,
        created_at: Utc::now().timestamp(),
        last_used_at: None,
        value: AuthTokenValue::generate(),
    };
    if let Err(err) = state.user_store.add_auth_token(&token) {
        return internal_error(err);
    }

    record_login_attempt(true);

    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, token.value.0.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    (
        StatusCode::CREATED,
        jar.add(cookie),
        Json(LoginSuccessResponse {
            token: token.value.0,
        }),
    )
        .into_response()
}

async fn logout(session: Session, State(state): State<ServerState>, jar: CookieJar) -> Response {
    if let Err(err) = state
        .user_store
        .delete_auth_token(&AuthTokenValue(session.token))
    {
        return internal_error(err);
    }

    (jar.remove(Cookie::from(COOKIE_SESSION_TOKEN_KEY)), StatusCode::OK).into_response()
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Deserialize, Debug)]
struct CreateCommentBody {
    pub content: String,
    pub parent_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct UpdateCommentBody {
    pub content: String,
}

#[derive(Deserialize, Debug)]
struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PageQuery {
    fn resolve(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        (page, limit)
    }
}

/// Let all connected clients know the comment list changed. Fire-and-forget;
/// clients with no live connection catch up on their next fetch.
async fn broadcast_comment_update(state: &ServerState, action: &str, comment_id: &str) {
    let message = ServerMessage::new(
        msg_types::COMMENT_UPDATE,
        ws_comments::CommentUpdateMessage::new(action, comment_id),
    );
    state.ws_connection_manager.broadcast_to_all(message).await;
}

async fn create_comment(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<CreateCommentBody>,
) -> Response {
    match state
        .comment_service
        .create(&body.content, session.user_id, body.parent_id)
        .await
    {
        Ok(comment) => {
            record_comment_mutation("created");
            broadcast_comment_update(&state, "created", &comment.id).await;
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn list_comments(
    State(comment_service): State<GuardedCommentService>,
    Query(query): Query<PageQuery>,
) -> Response {
    let (page, limit) = query.resolve();
    match comment_service.list(page, limit) {
        Ok(page) => Json(page).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_comment(
    State(comment_service): State<GuardedCommentService>,
    Path(id): Path<String>,
) -> Response {
    match comment_service.get(&id) {
        Ok(comment) => Json(comment).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_comment(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCommentBody>,
) -> Response {
    match state
        .comment_service
        .update(&id, &body.content, session.user_id)
    {
        Ok(comment) => {
            record_comment_mutation("updated");
            broadcast_comment_update(&state, "updated", &comment.id).await;
            Json(comment).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn delete_comment(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state.comment_service.delete(&id, session.user_id) {
        Ok(()) => {
            record_comment_mutation("deleted");
            broadcast_comment_update(&state, "deleted", &id).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn restore_comment(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state.comment_service.restore(&id, session.user_id) {
        Ok(comment) => {
            record_comment_mutation("restored");
            broadcast_comment_update(&state, "restored", &comment.id).await;
            Json(comment).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// ============================================================================
// Notifications
// ============================================================================

async fn list_notifications(
    session: Session,
    State(notification_service): State<GuardedNotificationService>,
    Query(query): Query<PageQuery>,
) -> Response {
    let (page, limit) = query.resolve();
    match notification_service.list_for_user(session.user_id, page, limit) {
        Ok(page) => Json(page).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn unread_notification_count(
    session: Session,
    State(notification_service): State<GuardedNotificationService>,
) -> Response {
    match notification_service.unread_count(session.user_id) {
        Ok(count) => Json(serde_json::json!({ "unread_count": count })).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn mark_notification_read(
    session: Session,
    State(notification_service): State<GuardedNotificationService>,
    Path(id): Path<String>,
) -> Response {
    match notification_service.mark_read(&id, session.user_id) {
        Ok(Some(notification)) => Json(notification).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => internal_error(err),
    }
}

async fn mark_all_notifications_read(
    session: Session,
    State(notification_service): State<GuardedNotificationService>,
) -> Response {
    match notification_service.mark_all_read(session.user_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => internal_error(err),
    }
}

// ============================================================================
// App assembly
// ============================================================================

pub async fn make_app(
    config: ServerConfig,
    comment_store: Arc<dyn CommentStore>,
    notification_store: Arc<dyn NotificationStore>,
    user_store: Arc<dyn UserStore>,
) -> Result<Router> {
    let ws_connection_manager = Arc::new(ConnectionManager::new());
    let page_cache = Arc::new(InMemoryPageCache::new(Duration::from_secs(
        config.page_cache_ttl_secs,
    )));

    let notification_service = Arc::new(NotificationService::new(
        notification_store,
        ws_connection_manager.clone(),
    ));
    let comment_service = Arc::new(CommentService::new(
        comment_store,
        user_store.clone(),
        page_cache,
        notification_service.clone(),
    ));

    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        comment_service,
        notification_service,
        user_store,
        ws_connection_manager,
        hash: env!("GIT_HASH").to_string(),
    };

    let mut app = Router::new()
        .route("/", get(home))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/logout", get(logout))
        .route("/v1/comments", post(create_comment).get(list_comments))
        .route(
            "/v1/comments/{id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/v1/comments/{id}/restore", put(restore_comment))
        .route("/v1/notifications", get(list_notifications))
        .route(
            "/v1/notifications/unread-count",
            get(unread_notification_count),
        )
        .route(
            "/v1/notifications/read-all",
            put(mark_all_notifications_read),
        )
        .route("/v1/notifications/{id}/read", put(mark_notification_read))
        .route("/v1/ws", get(ws_handler))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    if let Some(frontend_dir) = &config.frontend_dir_path {
        app = app.fallback_service(ServeDir::new(frontend_dir));
    }

    Ok(app.with_state(state))
}

pub async fn run_server(
    config: ServerConfig,
    comment_store: Arc<dyn CommentStore>,
    notification_store: Arc<dyn NotificationStore>,
    user_store: Arc<dyn UserStore>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, comment_store, notification_store, user_store).await?;

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on port {}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }
}
