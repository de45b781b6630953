use crate::server::RequestsLoggingLevel;

/// Runtime configuration of the HTTP server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub requests_logging_level: RequestsLoggingLevel,
    /// TTL for cached comment pages, in seconds. 0 disables the cache.
    pub page_cache_ttl_secs: u64,
    /// Directory to statically serve as the frontend, if any.
    pub frontend_dir_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            requests_logging_level: RequestsLoggingLevel::default(),
            page_cache_ttl_secs: 300,
            frontend_dir_path: None,
        }
    }
}
