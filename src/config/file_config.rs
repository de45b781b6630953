use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML config file. Values set here override the CLI flags.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub page_cache_ttl_secs: Option<u64>,
    pub frontend_dir_path: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_all_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.port.is_none());
        assert!(config.db_dir.is_none());
    }

    #[test]
    fn partial_file_parses() {
        let config: FileConfig = toml::from_str(
            r#"
            port = 8080
            page_cache_ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.page_cache_ttl_secs, Some(60));
        assert!(config.frontend_dir_path.is_none());
    }
}
