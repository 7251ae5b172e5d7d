//! MetricDB Server - HTTP API for the metric store

mod api;
mod protocol;

use anyhow::Context;
use metricdb_core::storage::{MetricStore, StoreConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable overriding the listen address
const HTTP_ADDR_ENV: &str = "METRICDB_HTTP_ADDR";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// Store configuration
    pub store: StoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8086)),
            store: StoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden from the environment
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self {
            store: StoreConfig::from_env()?,
            ..Default::default()
        };
        if let Ok(addr) = std::env::var(HTTP_ADDR_ENV) {
            config.http_addr = addr
                .parse()
                .with_context(|| format!("{} is not a socket address: {}", HTTP_ADDR_ENV, addr))?;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let config = ServerConfig::from_env()?;

    info!("Starting MetricDB server...");
    info!("Data directory: {:?}", config.store.data_dir);
    info!("Partition width: {} ms", config.store.timeshift_ms);
    info!("HTTP server: http://{}", config.http_addr);

    // Initialize store
    let store = MetricStore::with_config(config.store.clone())
        .with_context(|| format!("opening store at {:?}", config.store.data_dir))?;
    let store = Arc::new(store);

    // Create router
    let app = api::create_router(store.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!("MetricDB server listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close();
    info!("MetricDB server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
