//! QuoteFeed server binary
//!
//! Collects blue-dollar quotes on a fixed interval and serves the latest
//! batch statistics over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quotefeed_server::{QuoteService, ServerConfig};
use quotefeed_sources::{build_sources, default_sources, load_definitions, FetchCoordinator};

/// QuoteFeed CLI. Flags override the corresponding environment variables.
#[derive(Parser, Debug)]
#[command(name = "quotefeed")]
#[command(about = "Currency quote collector and statistics API")]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Store URL (`sqlite://path` or `memory`)
    #[arg(long)]
    database_url: Option<String>,

    /// Seconds between ingestion cycles
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Per-source request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// JSON file replacing the built-in source list
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.listen_port = port;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(secs) = self.interval_secs {
            config.ingest.fetch_interval = std::time::Duration::from_secs(secs);
        }
        if let Some(secs) = self.timeout_secs {
            config.ingest.source_timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(path) = self.sources {
            config.ingest.sources_file = Some(path);
        }
        config.log_json |= self.log_json;
    }
}

fn init_logging(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = ServerConfig::from_env();
    Args::parse().apply(&mut config);

    init_logging(&config);

    info!("Starting QuoteFeed");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let definitions = match &config.ingest.sources_file {
        Some(path) => load_definitions(path)?,
        None => default_sources(),
    };

    let client = reqwest::Client::builder()
        .timeout(config.ingest.source_timeout)
        .user_agent(concat!("quotefeed/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let coordinator = FetchCoordinator::new(build_sources(
        definitions,
        client,
        config.ingest.source_timeout,
    ));
    info!(sources = ?coordinator.source_names(), "Sources registered");

    let store = quotefeed_store::open(&config.database_url).await?;
    info!(database_url = %config.database_url, "Batch store ready");

    let service = Arc::new(QuoteService::new(config.clone(), coordinator, store));
    service.start().await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Server is listening");

    axum::serve(listener, service.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.stop().await?;

    info!("QuoteFeed shutdown complete");
    Ok(())
}
