//! Join and leave flows: room membership plus presence notices.
//!
//! Join and leave are the only paths that touch both a room's roster and
//! the Hub's global client index. Each updates the room under its lock
//! first, then the Hub, so the two maps can only disagree for the duration
//! of the update itself and the two locks are never held together.

use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{Context, Handler, Session};
use crate::state::{Client, Hub};
use async_trait::async_trait;
use flowstate_proto::{
    Envelope, JoinPayload, PresenceAction, PresencePayload, SyncPayload, decode_payload,
};
use tracing::info;

/// Handles `join`: attach the connection to a room, announce it to peers,
/// and send the newcomer a full document + roster snapshot.
pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Envelope) -> HandlerResult {
        let payload: JoinPayload = decode_payload(&msg.payload);

        let Some(room) = ctx.hub.get_room(&payload.room_id) else {
            let err = HandlerError::RoomNotFound(payload.room_id);
            if let Some(reply) = err.to_error_message() {
                ctx.sender.send(reply).await?;
            }
            return Ok(());
        };

        // A connection is in at most one room. Joining elsewhere runs the
        // full leave flow for the previous room first.
        leave_room(ctx.client_id, ctx.hub, ctx.session).await;

        let (client, sync) = {
            let mut guard = room.write().await;
            let client = Client::new(
                ctx.client_id,
                &payload.name,
                &payload.color,
                &guard.id,
                ctx.sender.clone(),
            );
            guard.join(client.clone());

            // Presence fan-out and the newcomer's snapshot come out of the
            // same critical section, so peers and the sync agree on the
            // roster.
            let presence = Envelope::presence(PresencePayload {
                user_id: ctx.client_id.to_string(),
                name: payload.name.clone(),
                color: Some(payload.color.clone()),
                action: PresenceAction::Joined,
            });
            guard.broadcast(ctx.client_id, &presence);

            let (document, clients) = guard.snapshot();
            (client, Envelope::sync(SyncPayload { document, clients }))
        };

        let room_id = client.room_id.clone();
        ctx.hub.register_client(client);
        ctx.sender.send(sync).await?;

        ctx.session.room = Some(room);
        ctx.session.name = Some(payload.name);
        info!(client_id = %ctx.client_id, room_id = %room_id, "Client joined room");
        Ok(())
    }
}

/// Handles `leave`: detach from the current room and notify peers.
pub struct LeaveHandler;

#[async_trait]
impl Handler for LeaveHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _msg: &Envelope) -> HandlerResult {
        leave_room(ctx.client_id, ctx.hub, ctx.session).await;
        Ok(())
    }
}

/// Remove the client from its current room and the Hub index, broadcasting
/// a departure notice to the remaining peers.
///
/// Idempotent: the session's room handle is taken up front, so running
/// this for both an explicit leave and the subsequent transport teardown
/// performs the removal exactly once.
pub async fn leave_room(client_id: &str, hub: &Hub, session: &mut Session) {
    let Some(room) = session.room.take() else {
        return;
    };
    session.name = None;

    let removed = {
        let mut guard = room.write().await;
        let removed = guard.leave(client_id);
        if let Some(client) = &removed {
            let presence = Envelope::presence(PresencePayload {
                user_id: client_id.to_string(),
                name: client.name.clone(),
                color: None,
                action: PresenceAction::Left,
            });
            guard.broadcast(client_id, &presence);
        }
        removed
    };

    hub.unregister_client(client_id);

    if let Some(client) = removed {
        info!(client_id = %client_id, room_id = %client.room_id, "Client left room");
    }
}
