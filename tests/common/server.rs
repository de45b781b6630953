//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases on a random port.

use super::constants::*;
use super::fixtures::create_test_databases;
use parlor_server::comments::SqliteCommentStore;
use parlor_server::notifications::{NotificationStore, SqliteNotificationStore};
use parlor_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use parlor_server::user::{SqliteUserStore, UserStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Direct store access for test setup and assertions
    pub user_store: Arc<dyn UserStore>,
    pub notification_store: Arc<dyn NotificationStore>,

    /// Path to the comments database, for tests that need to back-date rows
    pub comments_db_path: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with the default config.
    pub async fn spawn() -> Self {
        Self::spawn_with_cache_ttl(300).await
    }

    /// Spawns a test server with a specific page cache TTL (0 disables).
    pub async fn spawn_with_cache_ttl(page_cache_ttl_secs: u64) -> Self {
        let (temp_dir, paths) = create_test_databases().expect("Failed to create test databases");

        let comment_store =
            Arc::new(SqliteCommentStore::new(&paths.comments_db).expect("Failed to open comment store"));
        let notification_store: Arc<dyn NotificationStore> = Arc::new(
            SqliteNotificationStore::new(&paths.notifications_db)
                .expect("Failed to open notification store"),
        );
        let user_store: Arc<dyn UserStore> =
            Arc::new(SqliteUserStore::new(&paths.users_db).expect("Failed to open user store"));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            page_cache_ttl_secs,
            frontend_dir_path: None,
        };

        let app = make_app(
            config,
            comment_store,
            notification_store.clone(),
            user_store.clone(),
        )
        .await
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            user_store,
            notification_store,
            comments_db_path: paths.comments_db,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Shift a comment's created_at back in time, bypassing the service, to
    /// simulate an expired edit window.
    pub fn backdate_comment_created(&self, comment_id: &str, secs: i64) {
        let conn = rusqlite::Connection::open(&self.comments_db_path).unwrap();
        conn.execute(
            "UPDATE comments SET created_at = created_at - ?1 WHERE id = ?2",
            rusqlite::params![secs, comment_id],
        )
        .unwrap();
    }

    /// Shift a comment's deleted_at back in time, to simulate an expired
    /// restore window.
    pub fn backdate_comment_deleted(&self, comment_id: &str, secs: i64) {
        let conn = rusqlite::Connection::open(&self.comments_db_path).unwrap();
        conn.execute(
            "UPDATE comments SET deleted_at = deleted_at - ?1 WHERE id = ?2",
            rusqlite::params![secs, comment_id],
        )
        .unwrap();
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
