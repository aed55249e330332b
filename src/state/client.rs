//! Client-related types and state.

use chrono::{DateTime, Utc};
use flowstate_proto::{ClientSummary, Envelope};
use tokio::sync::mpsc;

/// One connected participant: identity, display attributes, and the
/// outbound queue feeding its connection task.
///
/// A `Client` appears in exactly one room's roster and in the Hub's global
/// index while joined; both entries are created and removed together.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique id, assigned per connection for the process lifetime.
    pub id: String,
    /// Display name from the join handshake.
    pub name: String,
    /// Display color from the join handshake.
    pub color: String,
    /// Id of the room this client is currently in.
    pub room_id: String,
    /// When the client last joined.
    pub last_seen: DateTime<Utc>,
    /// Outbound queue drained by the connection's write branch.
    pub sender: mpsc::Sender<Envelope>,
}

impl Client {
    pub fn new(
        id: &str,
        name: &str,
        color: &str,
        room_id: &str,
        sender: mpsc::Sender<Envelope>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            room_id: room_id.to_string(),
            last_seen: Utc::now(),
            sender,
        }
    }

    /// Roster entry for sync payloads and the management API.
    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            last_seen: self.last_seen,
        }
    }
}
