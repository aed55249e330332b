//! The Hub - central shared state for the collaboration daemon.
//!
//! The Hub owns the room map and a global client index in concurrent
//! collections accessible from any async task. It is serialized
//! independently of any single room's lock: join/leave update the room
//! under its lock first, then the Hub index, and never hold both at once.

use crate::state::{Client, Room};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Room identifier (UUID string).
pub type RoomId = String;

/// Client identifier (UUID string, process-lifetime).
pub type ClientId = String;

/// Management-surface view of a room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "clientCount")]
    pub client_count: usize,
}

/// Process-wide index of all rooms and all connected clients.
pub struct Hub {
    /// All rooms, indexed by id.
    rooms: DashMap<RoomId, Arc<RwLock<Room>>>,

    /// Global client index, mirroring membership across all rooms. A
    /// non-owning back-reference for O(1) lookup and teardown; the room's
    /// roster is the authoritative copy.
    clients: DashMap<ClientId, Client>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            clients: DashMap::new(),
        }
    }

    /// Create a room with a fresh document. Always succeeds.
    pub fn create_room(&self, name: &str) -> RoomSummary {
        let room = Room::new(name);
        let summary = RoomSummary {
            id: room.id.clone(),
            name: room.name.clone(),
            client_count: 0,
        };
        self.rooms
            .insert(room.id.clone(), Arc::new(RwLock::new(room)));
        crate::metrics::set_active_rooms(self.rooms.len());
        summary
    }

    /// Snapshot of all rooms, in no guaranteed order.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        // Collect handles first; awaiting while iterating the map would
        // hold a shard lock across suspension points.
        let rooms: Vec<Arc<RwLock<Room>>> =
            self.rooms.iter().map(|e| Arc::clone(e.value())).collect();

        let mut out = Vec::with_capacity(rooms.len());
        for room in rooms {
            let room = room.read().await;
            out.push(RoomSummary {
                id: room.id.clone(),
                name: room.name.clone(),
                client_count: room.len(),
            });
        }
        out
    }

    /// Look up a room by id.
    pub fn get_room(&self, room_id: &str) -> Option<Arc<RwLock<Room>>> {
        self.rooms.get(room_id).map(|e| Arc::clone(e.value()))
    }

    /// Remove a room. Clients still in it are not evicted or notified;
    /// their connections keep a handle until they leave or disconnect.
    pub fn delete_room(&self, room_id: &str) -> bool {
        let removed = self.rooms.remove(room_id).is_some();
        crate::metrics::set_active_rooms(self.rooms.len());
        removed
    }

    /// Add a client to the global index. Called immediately after the
    /// matching room roster insert.
    pub fn register_client(&self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }

    /// Remove a client from the global index. Called immediately after the
    /// matching room roster removal; safe to call when already absent.
    pub fn unregister_client(&self, client_id: &str) -> Option<Client> {
        self.clients.remove(client_id).map(|(_, c)| c)
    }

    /// Look up a client in the global index.
    pub fn get_client(&self, client_id: &str) -> Option<Client> {
        self.clients.get(client_id).map(|e| e.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
