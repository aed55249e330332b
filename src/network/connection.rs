//! Connection - Handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task: a `tokio::select!` loop
//! over the WebSocket read half and this connection's outbound queue.
//!
//! ```text
//!    ┌─────────────────────────────────────────────────────┐
//!    │                  Connection Task                    │
//!    │                                                     │
//!    │  ┌─────────────────┐       ┌──────────────────┐    │
//!    │  │  WS read half   │       │  WS write half   │    │
//!    │  └────────┬────────┘       └────────▲─────────┘    │
//!    │           │                         │              │
//!    │           ▼                         │              │
//!    │    tokio::select! ◄─────────────────┼──────────────┐
//!    │    │      │                         │              │
//!    │    │      ▼                         │              │
//!    │    │  [Handlers] ─────────▶ [Outbound Queue] ◄─── peers
//!    │    └───────────────────────────────────────────────┘
//!    └─────────────────────────────────────────────────────┘
//! ```
//!
//! The session moves Unjoined -> Joined on a successful join and back on
//! leave; when the read side terminates for any reason the task runs the
//! same leave flow as an explicit leave message, exactly once, then closes.

use crate::handlers::{Context, Registry, Session, leave_room};
use crate::state::Hub;
use flowstate_proto::Envelope;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, instrument, warn};

/// Capacity of the per-connection outbound queue. Broadcast delivery uses
/// `try_send`, so a reader that stops draining drops its own copies
/// instead of stalling the rooms it is in.
const OUTBOUND_QUEUE_SIZE: usize = 32;

/// A client connection handler.
pub struct Connection {
    client_id: String,
    addr: SocketAddr,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
    stream: WebSocketStream<TcpStream>,
}

impl Connection {
    /// Create a new connection handler.
    pub fn new(
        client_id: String,
        stream: WebSocketStream<TcpStream>,
        addr: SocketAddr,
        hub: Arc<Hub>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            client_id,
            addr,
            hub,
            registry,
            stream,
        }
    }

    /// Run the connection loop.
    #[instrument(skip(self), fields(client_id = %self.client_id, addr = %self.addr), name = "connection")]
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Client connected");
        crate::metrics::client_connected();

        let (mut writer, mut reader) = self.stream.split();

        // Outbound queue: handlers reply here, and room broadcasts from
        // peers land here via the Client registered on join.
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Envelope>(OUTBOUND_QUEUE_SIZE);

        let mut session = Session::default();

        loop {
            tokio::select! {
                // BRANCH A: transport input
                result = reader.next() => {
                    match result {
                        Some(Ok(frame)) => {
                            let text = match frame {
                                WsMessage::Text(text) => text,
                                WsMessage::Close(_) => {
                                    info!("Client sent close frame");
                                    break;
                                }
                                WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
                                other => {
                                    debug!(frame = ?other, "Ignoring non-text frame");
                                    continue;
                                }
                            };

                            // An envelope that doesn't decode at all (bad
                            // JSON, unknown type tag) is dropped; payload
                            // problems are the handlers' zero-value policy.
                            let msg: Envelope = match serde_json::from_str(&text) {
                                Ok(msg) => msg,
                                Err(e) => {
                                    debug!(error = %e, "Undecodable message ignored");
                                    continue;
                                }
                            };

                            let mut ctx = Context {
                                client_id: &self.client_id,
                                hub: &self.hub,
                                sender: &outgoing_tx,
                                session: &mut session,
                            };

                            if let Err(e) = self.registry.dispatch(&mut ctx, &msg).await {
                                debug!(error = ?e, code = e.error_code(), "Handler error");
                            }
                        }
                        Some(Err(e)) => {
                            debug!(error = %e, "Read error");
                            break;
                        }
                        None => {
                            info!("Client disconnected");
                            break;
                        }
                    }
                }

                // BRANCH B: outbound messages
                // Handler replies and broadcasts routed from peers.
                Some(msg) = outgoing_rx.recv() => {
                    let text = match serde_json::to_string(&msg) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "Failed to encode outbound message");
                            continue;
                        }
                    };
                    if let Err(e) = writer.send(WsMessage::Text(text)).await {
                        debug!(error = %e, "Write error");
                        break;
                    }
                }
            }
        }

        // Teardown runs the same leave flow as an explicit leave message.
        // Session::room was taken if the client already left, so this is
        // a no-op in that case.
        leave_room(&self.client_id, &self.hub, &mut session).await;

        crate::metrics::client_disconnected();
        info!("Client disconnected");

        Ok(())
    }
}
