use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parlor_server::comments::SqliteCommentStore;
use parlor_server::config::FileConfig;
use parlor_server::notifications::SqliteNotificationStore;
use parlor_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use parlor_server::user::SqliteUserStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite databases (created if missing).
    #[clap(value_parser = parse_path)]
    pub db_dir: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// TTL in seconds for cached comment pages. 0 disables the cache.
    #[clap(long, default_value_t = 300)]
    pub page_cache_ttl_secs: u64,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Optional TOML config file; values set there override these flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    if let Some(config_path) = &cli_args.config {
        let file_config = FileConfig::load(config_path)?;
        info!("Loaded config file {:?}", config_path);

        if let Some(db_dir) = file_config.db_dir {
            cli_args.db_dir = parse_path(&db_dir)?;
        }
        if let Some(port) = file_config.port {
            cli_args.port = port;
        }
        if let Some(metrics_port) = file_config.metrics_port {
            cli_args.metrics_port = metrics_port;
        }
        if let Some(level) = file_config.logging_level {
            cli_args.logging_level = RequestsLoggingLevel::from_str(&level, true)
                .map_err(|e| anyhow::anyhow!("Invalid logging_level in config file: {}", e))?;
        }
        if let Some(ttl) = file_config.page_cache_ttl_secs {
            cli_args.page_cache_ttl_secs = ttl;
        }
        if let Some(frontend) = file_config.frontend_dir_path {
            cli_args.frontend_dir_path = Some(frontend);
        }
    }

    std::fs::create_dir_all(&cli_args.db_dir)
        .with_context(|| format!("Failed to create db dir {:?}", cli_args.db_dir))?;

    info!("Opening databases in {:?}...", cli_args.db_dir);
    let comment_store = Arc::new(SqliteCommentStore::new(cli_args.db_dir.join("comments.db"))?);
    let notification_store = Arc::new(SqliteNotificationStore::new(
        cli_args.db_dir.join("notifications.db"),
    )?);
    let user_store = Arc::new(SqliteUserStore::new(cli_args.db_dir.join("users.db"))?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    let metrics_port = cli_args.metrics_port;
    tokio::spawn(async move {
        if let Err(err) = metrics::run_metrics_server(metrics_port).await {
            error!("Metrics server failed: {}", err);
        }
    });

    let config = ServerConfig {
        port: cli_args.port,
        requests_logging_level: cli_args.logging_level,
        page_cache_ttl_secs: cli_args.page_cache_ttl_secs,
        frontend_dir_path: cli_args.frontend_dir_path,
    };

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", metrics_port);
    run_server(config, comment_store, notification_store, user_store).await
}
