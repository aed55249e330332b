//! flowstated - FlowState real-time collaboration daemon.
//!
//! WebSocket clients join named rooms, see each other's presence, exchange
//! ephemeral cursor/focus/typing events, and converge on a shared document
//! via last-writer-wins edits. An HTTP sidecar exposes room management,
//! health, and Prometheus metrics.

mod config;
mod error;
mod handlers;
mod http;
mod metrics;
mod network;
mod state;

use crate::config::Config;
use crate::handlers::Registry;
use crate::network::Gateway;
use crate::state::Hub;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(server = %config.server.name, "Starting flowstated");

    metrics::init();

    // The Hub is the process-wide room/client index. It is constructed here
    // and handed to every task explicitly; nothing reaches it ambiently.
    let hub = Arc::new(Hub::new());

    // HTTP sidecar: health, room management API, Prometheus metrics.
    // Convention: http.port = 0 disables the listener (used by tests).
    let http_port = config.http.port;
    if http_port == 0 {
        info!("HTTP server disabled");
    } else {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            http::run_http_server(http_port, hub).await;
        });
        info!(port = http_port, "HTTP server started");
    }

    // Message router: dispatch table from message type to handler.
    let registry = Arc::new(Registry::new());

    // Start the WebSocket gateway
    let gateway = Gateway::bind(
        config.listen.address,
        config.websocket,
        Arc::clone(&hub),
        registry,
    )
    .await?;

    gateway.run().await?;

    Ok(())
}
