//! Document edits and sync snapshots.

use crate::error::HandlerResult;
use crate::handlers::{Context, Handler};
use async_trait::async_trait;
use flowstate_proto::{Envelope, EditPayload, SyncPayload, decode_payload};
use tracing::debug;

/// Handles `edit`: apply the last-writer-wins update, then rebroadcast the
/// raw edit message to peers.
pub struct EditHandler;

#[async_trait]
impl Handler for EditHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Envelope) -> HandlerResult {
        let Some(room) = ctx.session.room.as_ref() else {
            return Ok(());
        };
        let payload: EditPayload = decode_payload(&msg.payload);

        // Mutation and fan-out share one exclusive critical section, so
        // peers observe edits in the order they were applied. The raw
        // message goes out as-is: the client's version claim rides along
        // even though only the stored counter is authoritative.
        let mut guard = room.write().await;
        let doc = guard.apply_edit(payload.content);
        guard.broadcast(ctx.client_id, msg);
        debug!(client_id = %ctx.client_id, version = doc.version, "Edit applied");
        Ok(())
    }
}

/// Handles `sync`: send a fresh snapshot to the requester only.
pub struct SyncHandler;

#[async_trait]
impl Handler for SyncHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _msg: &Envelope) -> HandlerResult {
        let Some(room) = ctx.session.room.as_ref() else {
            return Ok(());
        };
        let (document, clients) = {
            let guard = room.read().await;
            guard.snapshot()
        };
        ctx.sender
            .send(Envelope::sync(SyncPayload { document, clients }))
            .await?;
        Ok(())
    }
}
