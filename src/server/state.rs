use axum::extract::FromRef;

use crate::comments::CommentService;
use crate::notifications::NotificationService;
use crate::user::UserStore;
use std::sync::Arc;
use std::time::Instant;

use super::websocket::ConnectionManager;
use super::ServerConfig;

pub type GuardedCommentService = Arc<CommentService>;
pub type GuardedNotificationService = Arc<NotificationService>;
pub type GuardedUserStore = Arc<dyn UserStore>;
pub type GuardedConnectionManager = Arc<ConnectionManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub comment_service: GuardedCommentService,
    pub notification_service: GuardedNotificationService,
    pub user_store: GuardedUserStore,
    pub ws_connection_manager: GuardedConnectionManager,
    pub hash: String,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedCommentService {
    fn from_ref(input: &ServerState) -> Self {
        input.comment_service.clone()
    }
}

impl FromRef<ServerState> for GuardedNotificationService {
    fn from_ref(input: &ServerState) -> Self {
        input.notification_service.clone()
    }
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedConnectionManager {
    fn from_ref(input: &ServerState) -> Self {
        input.ws_connection_manager.clone()
    }
}
