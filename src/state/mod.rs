//! Shared state for the collaboration hub.

mod client;
mod hub;
mod room;

pub use client::Client;
pub use hub::{Hub, RoomSummary};
pub use room::Room;
