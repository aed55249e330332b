//! Integration tests for disconnects and presence teardown.

mod common;

use common::TestServer;
use flowstate_proto::MessageType;
use std::time::Duration;

#[tokio::test]
async fn test_unclean_disconnect_emits_single_left_presence() {
    let server = TestServer::spawn(18811, 18812)
        .await
        .expect("Failed to spawn server");
    let room_id = server.create_room("Retro").await.expect("create room");

    let mut alice = server.connect().await.expect("alice connect");
    alice.join(&room_id, "alice", "#ff0000").await.expect("alice join");
    alice
        .recv_until(|m| m.kind == MessageType::Sync)
        .await
        .expect("alice sync");

    let mut bob = server.connect().await.expect("bob connect");
    bob.join(&room_id, "bob", "#00ff00").await.expect("bob join");
    bob.recv_until(|m| m.kind == MessageType::Sync)
        .await
        .expect("bob sync");

    // Drop alice's socket without a close handshake.
    drop(alice);

    let msgs = bob
        .recv_until(|m| m.kind == MessageType::Presence && m.payload["action"] == "left")
        .await
        .expect("left presence for bob");
    let presence = msgs.last().unwrap();
    assert_eq!(presence.payload["name"], "alice");

    // Exactly one departure notice, nothing trailing.
    assert!(bob.recv_timeout(Duration::from_millis(300)).await.is_err());

    // The roster no longer lists alice.
    bob.request_sync().await.expect("sync request");
    let msgs = bob
        .recv_until(|m| m.kind == MessageType::Sync)
        .await
        .expect("bob resync");
    let sync = msgs.last().unwrap();
    let clients = sync.payload["clients"].as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["name"], "bob");
}

#[tokio::test]
async fn test_explicit_leave_then_disconnect_notifies_once() {
    let server = TestServer::spawn(18813, 18814)
        .await
        .expect("Failed to spawn server");
    let room_id = server.create_room("Huddle").await.expect("create room");

    let mut alice = server.connect().await.expect("alice connect");
    alice.join(&room_id, "alice", "#ff0000").await.expect("alice join");
    alice
        .recv_until(|m| m.kind == MessageType::Sync)
        .await
        .expect("alice sync");

    let mut bob = server.connect().await.expect("bob connect");
    bob.join(&room_id, "bob", "#00ff00").await.expect("bob join");
    bob.recv_until(|m| m.kind == MessageType::Sync)
        .await
        .expect("bob sync");

    alice.leave().await.expect("alice leave");

    bob.recv_until(|m| m.kind == MessageType::Presence && m.payload["action"] == "left")
        .await
        .expect("left presence for bob");

    // Disconnecting after the explicit leave must not produce a second
    // departure notice.
    drop(alice);
    assert!(bob.recv_timeout(Duration::from_millis(500)).await.is_err());
}

#[tokio::test]
async fn test_rejoin_moves_client_between_rooms() {
    let server = TestServer::spawn(18815, 18816)
        .await
        .expect("Failed to spawn server");
    let room_a = server.create_room("Alpha").await.expect("create room a");
    let room_b = server.create_room("Beta").await.expect("create room b");

    let mut watcher = server.connect().await.expect("watcher connect");
    watcher
        .join(&room_a, "watcher", "#0000ff")
        .await
        .expect("watcher join");
    watcher
        .recv_until(|m| m.kind == MessageType::Sync)
        .await
        .expect("watcher sync");

    let mut mover = server.connect().await.expect("mover connect");
    mover.join(&room_a, "mover", "#ff00ff").await.expect("mover join a");
    mover
        .recv_until(|m| m.kind == MessageType::Sync)
        .await
        .expect("mover sync a");
    watcher
        .recv_until(|m| m.kind == MessageType::Presence && m.payload["action"] == "joined")
        .await
        .expect("mover arrival");

    // Joining a second room implicitly leaves the first.
    mover.join(&room_b, "mover", "#ff00ff").await.expect("mover join b");
    let msgs = mover
        .recv_until(|m| m.kind == MessageType::Sync)
        .await
        .expect("mover sync b");
    let sync = msgs.last().unwrap();
    let clients = sync.payload["clients"].as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["name"], "mover");

    watcher
        .recv_until(|m| m.kind == MessageType::Presence && m.payload["action"] == "left")
        .await
        .expect("mover departure");
}
