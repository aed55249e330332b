//! Test WebSocket client.
//!
//! Drives the collaboration protocol for integration testing: send typed
//! envelopes, assert on received ones.

use flowstate_proto::{Envelope, MessageType};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// A test collaboration client.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[allow(dead_code)]
impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let (ws, _response) = connect_async(format!("ws://{address}")).await?;
        Ok(Self { ws })
    }

    /// Send an envelope.
    pub async fn send(&mut self, msg: &Envelope) -> anyhow::Result<()> {
        let text = serde_json::to_string(msg)?;
        self.ws.send(WsMessage::Text(text)).await?;
        Ok(())
    }

    /// Send a join message.
    pub async fn join(&mut self, room_id: &str, name: &str, color: &str) -> anyhow::Result<()> {
        self.send(&Envelope::new(
            MessageType::Join,
            serde_json::json!({"roomId": room_id, "name": name, "color": color}),
        ))
        .await
    }

    /// Send an edit message.
    pub async fn edit(&mut self, content: &str, version: u64) -> anyhow::Result<()> {
        self.send(&Envelope::new(
            MessageType::Edit,
            serde_json::json!({"content": content, "version": version}),
        ))
        .await
    }

    /// Request a fresh snapshot.
    pub async fn request_sync(&mut self) -> anyhow::Result<()> {
        self.send(&Envelope::new(MessageType::Sync, serde_json::json!({})))
            .await
    }

    /// Send a leave message.
    pub async fn leave(&mut self) -> anyhow::Result<()> {
        self.send(&Envelope::new(MessageType::Leave, serde_json::json!({})))
            .await
    }

    /// Receive a single envelope from the server.
    pub async fn recv(&mut self) -> anyhow::Result<Envelope> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive an envelope with a timeout, skipping non-text frames.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Envelope> {
        loop {
            let frame = timeout(dur, self.ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
            if let WsMessage::Text(text) = frame {
                return Ok(serde_json::from_str(&text)?);
            }
        }
    }

    /// Receive envelopes until the given predicate returns true.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<Envelope>>
    where
        F: FnMut(&Envelope) -> bool,
    {
        let mut messages = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = predicate(&msg);
            messages.push(msg);
            if done {
                break;
            }
        }
        Ok(messages)
    }
}
