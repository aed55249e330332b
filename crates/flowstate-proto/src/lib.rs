//! # flowstate-proto
//!
//! Wire protocol types for the FlowState collaboration daemon.
//!
//! Every frame on the wire is a JSON-encoded [`Envelope`]: a `type` tag, an
//! opaque payload decoded by whichever handler owns that type, and optional
//! `from`/`room` fields that the server stamps when relaying. Payload field
//! names are camelCase on the wire.

#![deny(clippy::all)]
#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Message type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Attach this connection to a room.
    Join,
    /// Detach from the current room.
    Leave,
    /// Ephemeral cursor position, relayed to peers.
    Cursor,
    /// Ephemeral focus change, relayed to peers.
    Focus,
    /// Replace-and-bump document edit.
    Edit,
    /// Server-emitted join/leave notice.
    Presence,
    /// Ephemeral typing indicator, relayed to peers.
    Typing,
    /// Request (client) or deliver (server) a document + roster snapshot.
    Sync,
    /// Server-emitted error report.
    Error,
}

impl MessageType {
    /// Static name for logging and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Cursor => "cursor",
            Self::Focus => "focus",
            Self::Edit => "edit",
            Self::Presence => "presence",
            Self::Typing => "typing",
            Self::Sync => "sync",
            Self::Error => "error",
        }
    }
}

/// The message envelope.
///
/// `from` and `room` are server-stamped on relay; values supplied by a
/// client are overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type tag, selects the payload shape.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Opaque payload, typed by `kind`.
    #[serde(default)]
    pub payload: Value,
    /// Sender id, stamped by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Room id, stamped by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Envelope {
    /// Build an envelope with no routing fields set.
    pub fn new(kind: MessageType, payload: Value) -> Self {
        Self {
            kind,
            payload,
            from: None,
            room: None,
        }
    }

    /// Build an `error` message for the given reason.
    pub fn error(reason: &str) -> Self {
        let payload = ErrorPayload {
            error: reason.to_string(),
        };
        Self::new(MessageType::Error, encode_payload(&payload))
    }

    /// Build a `presence` notice.
    pub fn presence(payload: PresencePayload) -> Self {
        Self::new(MessageType::Presence, encode_payload(&payload))
    }

    /// Build a `sync` snapshot message.
    pub fn sync(payload: SyncPayload) -> Self {
        Self::new(MessageType::Sync, encode_payload(&payload))
    }
}

/// Decode a payload under the zero-value policy: an undecodable body yields
/// default fields rather than rejecting the message.
pub fn decode_payload<T: DeserializeOwned + Default>(payload: &Value) -> T {
    serde_json::from_value(payload.clone()).unwrap_or_default()
}

/// Encode a payload value. Serialization of these plain data types cannot
/// fail in practice; a failure degrades to a null payload.
fn encode_payload<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

/// Payload of a client `join` message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinPayload {
    /// Id of the room to join.
    pub room_id: String,
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: String,
}

/// Payload of a client `edit` message.
///
/// `version` is the version the client believes it edited. It is
/// informational only: the server rebroadcasts it but never validates it,
/// and the stored version advances by exactly 1 per accepted edit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EditPayload {
    /// Full replacement content.
    pub content: String,
    /// Client-claimed version, not authoritative.
    pub version: u64,
}

/// Whether a presence notice reports an arrival or a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceAction {
    /// The participant joined the room.
    Joined,
    /// The participant left the room.
    Left,
}

/// Payload of a server `presence` notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    /// Id of the participant that joined or left.
    pub user_id: String,
    /// Display name of the participant.
    pub name: String,
    /// Display color; carried on `joined`, omitted on `left`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Joined or left.
    pub action: PresenceAction,
}

/// Payload of a server `sync` message: the room at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Current document state.
    pub document: Document,
    /// Full roster at the same moment.
    pub clients: Vec<ClientSummary>,
}

/// Payload of a server `error` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable reason.
    pub error: String,
}

/// The shared text state for a room, versioned by an edit counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document id, distinct from the room id.
    pub id: String,
    /// Full text content.
    pub content: String,
    /// Edit counter; increments by exactly 1 per accepted edit.
    pub version: u64,
    /// When the last edit was applied.
    pub updated: DateTime<Utc>,
}

impl Document {
    /// Fresh empty document at version 0.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: String::new(),
            version: 0,
            updated: Utc::now(),
        }
    }

    /// Replace the content and bump the version.
    ///
    /// Last-writer-wins: no merge is attempted, and whatever version the
    /// editing client claimed plays no part here.
    pub fn apply_edit(&mut self, content: String) {
        self.content = content;
        self.version += 1;
        self.updated = Utc::now();
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Roster entry exposed in sync payloads and the management API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSummary {
    /// Participant id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// When the participant joined the room.
    #[serde(rename = "lastSeen")]
    pub last_seen: DateTime<Utc>,
}
