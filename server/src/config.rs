//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use quotefeed_common::{constants, DurationExt};

/// Ingestion configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Interval between ingestion cycles.
    pub fetch_interval: Duration,
    /// Bound on each upstream request.
    pub source_timeout: Duration,
    /// JSON file replacing the built-in source list.
    pub sources_file: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_interval: constants::fetch_interval().as_std(),
            source_timeout: constants::source_timeout().as_std(),
            sources_file: None,
        }
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Store URL (`sqlite:...` or `memory`).
    pub database_url: String,
    /// Ingestion configuration.
    pub ingest: IngestConfig,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON log lines.
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 3000,
            database_url: "sqlite://database.sqlite".to_string(),
            ingest: IngestConfig::default(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(secs) = std::env::var("FETCH_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.ingest.fetch_interval = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("SOURCE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.ingest.source_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(path) = std::env::var("QUOTEFEED_SOURCES_FILE") {
            config.ingest.sources_file = Some(PathBuf::from(path));
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.ingest.fetch_interval < constants::min_fetch_interval().as_std() {
            return Err("Fetch interval must be at least 1 second".to_string());
        }

        if self.ingest.source_timeout.is_zero() {
            return Err("Source timeout cannot be 0".to_string());
        }

        if self.ingest.source_timeout >= self.ingest.fetch_interval {
            return Err("Source timeout must be shorter than the fetch interval".to_string());
        }

        Ok(())
    }
}
