//! Room state: one shared document plus the member roster.
//!
//! A `Room` lives behind a single `tokio::sync::RwLock` in the Hub. All
//! mutation (`join`, `leave`, `apply_edit`) goes through the exclusive
//! form; reads (`snapshot`, fan-out enumeration) take the shared form.
//! Broadcast performs no I/O under the lock: each copy goes into the
//! recipient's outbound queue with a non-blocking `try_send`.

use crate::state::Client;
use flowstate_proto::{ClientSummary, Document, Envelope};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// A named collaboration session: one document, many clients.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub name: String,
    clients: HashMap<String, Client>,
    document: Document,
}

impl Room {
    /// Create an empty room with a fresh document at version 0.
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            clients: HashMap::new(),
            document: Document::new(),
        }
    }

    /// Insert a client into the roster. Joining again overwrites the
    /// previous entry for the same id.
    pub fn join(&mut self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }

    /// Remove a client, returning the prior entry for use in a departure
    /// notice. Returns `None` if the client was not present, which callers
    /// treat as an already-completed leave.
    pub fn leave(&mut self, client_id: &str) -> Option<Client> {
        self.clients.remove(client_id)
    }

    /// Number of clients currently in the room.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Apply a last-writer-wins edit: unconditionally replace the content
    /// and bump the stored version by 1. Whatever version the client
    /// claimed is not consulted.
    pub fn apply_edit(&mut self, content: String) -> Document {
        self.document.apply_edit(content);
        crate::metrics::record_edit();
        self.document.clone()
    }

    /// Document and roster at a single consistent point in time. Callers
    /// hold the room lock for the duration, so the two never come from
    /// different moments.
    pub fn snapshot(&self) -> (Document, Vec<ClientSummary>) {
        let clients = self.clients.values().map(Client::summary).collect();
        (self.document.clone(), clients)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Fan a message out to every member except the sender, stamping the
    /// envelope with the sender and room ids.
    ///
    /// Delivery is fire-and-forget per recipient: a full or closed outbound
    /// queue drops that one copy without blocking the others and without
    /// surfacing an error to the sender. Returns the number of copies
    /// delivered.
    pub fn broadcast(&self, sender_id: &str, msg: &Envelope) -> usize {
        let mut msg = msg.clone();
        msg.from = Some(sender_id.to_string());
        msg.room = Some(self.id.clone());

        let mut delivered = 0;
        for (id, client) in &self.clients {
            if id == sender_id {
                continue;
            }
            match client.sender.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    crate::metrics::record_dropped_send();
                    debug!(recipient = %id, error = %e, "Dropped broadcast copy");
                }
            }
        }
        crate::metrics::record_fanout(delivered);
        delivered
    }
}
