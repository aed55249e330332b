//! Ephemeral event relay: cursor, focus, typing.

use crate::error::HandlerResult;
use crate::handlers::{Context, Handler};
use async_trait::async_trait;
use flowstate_proto::Envelope;

/// Relays an envelope verbatim to the sender's peers, tagged with the
/// sender id. These events are fire-and-forget and never persisted.
pub struct RelayHandler;

#[async_trait]
impl Handler for RelayHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Envelope) -> HandlerResult {
        // Dispatch guarantees a joined session here.
        let Some(room) = ctx.session.room.as_ref() else {
            return Ok(());
        };
        let guard = room.read().await;
        guard.broadcast(ctx.client_id, msg);
        Ok(())
    }
}
