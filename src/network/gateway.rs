//! Gateway - TCP listener that accepts incoming WebSocket connections.
//!
//! The Gateway binds the listen address and spawns a Connection task for
//! each accepted client, validating the Origin header against the
//! configured allow-list during the WebSocket handshake.

use crate::config::WebSocketConfig;
use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::Hub;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// The Gateway accepts incoming connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    allow_origins: Vec<String>,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(
        addr: SocketAddr,
        websocket_config: WebSocketConfig,
        hub: Arc<Hub>,
        registry: Arc<Registry>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "WebSocket listener bound");

        Ok(Self {
            listener,
            allow_origins: websocket_config.allow_origins,
            hub,
            registry,
        })
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "WebSocket connection attempt");

                    let hub = Arc::clone(&self.hub);
                    let registry = Arc::clone(&self.registry);
                    let allowed = self.allow_origins.clone();
                    let client_id = Uuid::new_v4().to_string();

                    tokio::spawn(async move {
                        // CORS validation callback for WebSocket handshake
                        let cors_callback =
                            |req: &http::Request<()>, response: http::Response<()>| {
                                // If allow_origins is empty, allow all origins
                                if allowed.is_empty() {
                                    return Ok(response);
                                }

                                // Check Origin header against allowed origins
                                if let Some(origin) =
                                    req.headers().get("Origin").and_then(|o| o.to_str().ok())
                                {
                                    if allowed.iter().any(|a| a == origin || a == "*") {
                                        return Ok(response);
                                    }
                                    warn!(%addr, origin = %origin, "WebSocket CORS rejected");
                                }

                                // Reject with 403 Forbidden
                                Err(http::Response::builder()
                                    .status(http::StatusCode::FORBIDDEN)
                                    .body(Some("CORS origin not allowed".to_string()))
                                    .unwrap())
                            };

                        // Perform WebSocket handshake with CORS validation
                        match accept_hdr_async(stream, cors_callback).await {
                            Ok(ws_stream) => {
                                let connection = Connection::new(
                                    client_id.clone(),
                                    ws_stream,
                                    addr,
                                    hub,
                                    registry,
                                );
                                if let Err(e) = connection.run().await {
                                    error!(%client_id, %addr, error = %e, "Connection error");
                                }
                                info!(%client_id, %addr, "Connection closed");
                            }
                            Err(e) => {
                                warn!(%addr, error = %e, "WebSocket handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
