use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Metric name prefix for all Parlor metrics
const PREFIX: &str = "parlor";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Authentication Metrics
    pub static ref AUTH_LOGIN_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_login_attempts_total"), "Total login attempts"),
        &["status"]
    ).expect("Failed to create auth_login_attempts_total metric");

    // Domain Metrics
    pub static ref COMMENT_MUTATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_comment_mutations_total"), "Successful comment mutations"),
        &["action"]
    ).expect("Failed to create comment_mutations_total metric");

    pub static ref NOTIFICATIONS_CREATED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_notifications_created_total"),
        "Total notifications created"
    ).expect("Failed to create notifications_created_total metric");

    // WebSocket Metrics
    pub static ref WS_ACTIVE_CONNECTIONS: Gauge = Gauge::new(
        format!("{PREFIX}_ws_active_connections"),
        "Number of active WebSocket connections"
    ).expect("Failed to create ws_active_connections metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(COMMENT_MUTATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(NOTIFICATIONS_CREATED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(WS_ACTIVE_CONNECTIONS.clone()));

    tracing::info!("Metrics system initialized");
}

/// Record an HTTP request with its outcome and duration.
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a successful comment mutation.
pub fn record_comment_mutation(action: &str) {
    COMMENT_MUTATIONS_TOTAL.with_label_values(&[action]).inc();
}

/// Record a login attempt.
pub fn record_login_attempt(success: bool) {
    let status = if success { "success" } else { "failure" };
    AUTH_LOGIN_ATTEMPTS_TOTAL.with_label_values(&[status]).inc();
}

/// Handler for `GET /metrics` on the metrics port.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (StatusCode::OK, buffer).into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve the Prometheus scrape endpoint on its own port.
pub async fn run_metrics_server(port: u16) -> anyhow::Result<()> {
    let app = axum::Router::new().route("/metrics", axum::routing::get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
