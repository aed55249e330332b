//! Message handlers and dispatch.
//!
//! Incoming envelopes are dispatched by type tag to handler objects held
//! in a [`Registry`]. Types with no handler are ignored without error, and
//! any non-join message from a connection that has not joined a room is
//! silently dropped — out-of-order messages are defined as no-ops, not
//! protocol errors.

mod document;
mod relay;
mod session;

pub use document::{EditHandler, SyncHandler};
pub use relay::RelayHandler;
pub use session::{JoinHandler, LeaveHandler, leave_room};

use crate::error::HandlerResult;
use crate::state::{Hub, Room};
use async_trait::async_trait;
use flowstate_proto::{Envelope, MessageType};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

/// Per-connection session state.
///
/// The state machine Unjoined -> Joined -> Closed collapses to "is `room`
/// set": unjoined connections carry `None`, and the connection task closes
/// the session exactly once on teardown.
#[derive(Default)]
pub struct Session {
    /// Handle to the joined room. Held directly so relaying needs no Hub
    /// lookup, and so members of a deleted room keep talking among
    /// themselves until they leave.
    pub room: Option<Arc<RwLock<Room>>>,
    /// Display name from the join handshake, for the departure notice.
    pub name: Option<String>,
}

impl Session {
    pub fn is_joined(&self) -> bool {
        self.room.is_some()
    }
}

/// Handler context passed to each message handler.
pub struct Context<'a> {
    /// This connection's client id.
    pub client_id: &'a str,
    /// Shared server state.
    pub hub: &'a Arc<Hub>,
    /// Outbound queue for this connection.
    pub sender: &'a mpsc::Sender<Envelope>,
    /// Current session state.
    pub session: &'a mut Session,
}

/// A message handler for one or more message types.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Envelope) -> HandlerResult;
}

/// Dispatch table from message type to handler behavior.
pub struct Registry {
    handlers: HashMap<MessageType, Box<dyn Handler>>,
}

impl Registry {
    pub fn new() -> Self {
        let mut handlers: HashMap<MessageType, Box<dyn Handler>> = HashMap::new();
        handlers.insert(MessageType::Join, Box::new(JoinHandler));
        handlers.insert(MessageType::Leave, Box::new(LeaveHandler));
        handlers.insert(MessageType::Cursor, Box::new(RelayHandler));
        handlers.insert(MessageType::Focus, Box::new(RelayHandler));
        handlers.insert(MessageType::Typing, Box::new(RelayHandler));
        handlers.insert(MessageType::Edit, Box::new(EditHandler));
        handlers.insert(MessageType::Sync, Box::new(SyncHandler));
        Self { handlers }
    }

    /// Route a message to its handler.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, msg: &Envelope) -> HandlerResult {
        if msg.kind != MessageType::Join && !ctx.session.is_joined() {
            debug!(kind = %msg.kind.as_str(), "Dropping message from unjoined connection");
            return Ok(());
        }

        let Some(handler) = self.handlers.get(&msg.kind) else {
            debug!(kind = %msg.kind.as_str(), "No handler for message type");
            return Ok(());
        };

        crate::metrics::record_message(msg.kind.as_str());
        handler.handle(ctx, msg).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
