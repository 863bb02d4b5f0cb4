//! Integration tests for the Parlor server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parlor::prelude::*;
use parlor_client::ParlorClient;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Test room type
// =========================================================================

/// Appends `{"text": ...}` messages to a `log` array in its state.
struct Board;

impl RoomBehavior for Board {
    fn on_message(
        &mut self,
        room: &mut Room,
        _sender: ClientId,
        message: Value,
    ) -> Result<(), RoomError> {
        let text = message
            .get("text")
            .cloned()
            .ok_or_else(|| RoomError::MessageRejected("missing text".into()))?;
        let mut log = room
            .state()
            .get("log")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        log.push(text);
        room.merge_state(RoomState::new().with("log", log));
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port and returns its address and registry.
async fn start_server() -> (String, SharedRegistry) {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .room_type("chat", factory(|_| PlainRoom))
        .room_type("board", factory(|_| Board))
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let registry = server.registry();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, registry)
}

async fn connect(addr: &str) -> ParlorClient {
    ParlorClient::connect(&format!("ws://{addr}"))
        .await
        .expect("should connect")
}

async fn recv(client: &mut ParlorClient) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), client.next_event())
        .await
        .expect("should receive within timeout")
        .expect("frame should be a valid event")
        .expect("connection should stay open")
}

/// Asserts nothing arrives for a short while.
async fn assert_silent(client: &mut ParlorClient) {
    let next = tokio::time::timeout(Duration::from_millis(100), client.next_event()).await;
    assert!(next.is_err(), "unexpected event: {next:?}");
}

async fn join_or_create(client: &mut ParlorClient, room_type: &str) -> RoomView {
    client
        .join_or_create_room(room_type)
        .await
        .expect("send should succeed");
    match recv(client).await {
        ServerEvent::JoinedRoom(view) => view,
        other => panic!("expected joinedRoom, got {other:?}"),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_server_builds_and_binds() {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("should have local addr");
    assert_ne!(addr.port(), 0);
}

#[tokio::test]
async fn test_builder_rejects_duplicate_room_type_when_configured() {
    let result = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .registry_config(RegistryConfig {
            allow_type_redefinition: false,
            ..RegistryConfig::default()
        })
        .room_type("chat", factory(|_| PlainRoom))
        .room_type("chat", factory(|_| Board))
        .build()
        .await;

    assert!(matches!(
        result,
        Err(ParlorError::Room(RoomError::RoomTypeAlreadyDefined(_)))
    ));
}

#[tokio::test]
async fn test_join_or_create_room_confirms_with_view() {
    let (addr, _registry) = start_server().await;
    let mut ws = connect(&addr).await;

    let view = join_or_create(&mut ws, "chat").await;

    assert_eq!(view.room_type, "chat");
    assert!(view.id.as_str().starts_with("room_"));
    assert!(view.state.is_empty());
}

#[tokio::test]
async fn test_two_clients_share_one_room() {
    let (addr, registry) = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;

    let first = join_or_create(&mut a, "chat").await;
    let second = join_or_create(&mut b, "chat").await;

    assert_eq!(first.id, second.id);
    let registry = registry.lock().await;
    assert_eq!(registry.room_count(), 1);
    assert_eq!(registry.get_room(&first.id).unwrap().member_count(), 2);
}

#[tokio::test]
async fn test_server_side_state_change_reaches_all_members() {
    let (addr, registry) = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    let room = join_or_create(&mut a, "chat").await;
    join_or_create(&mut b, "chat").await;

    registry
        .lock()
        .await
        .merge_room_state(&room.id, RoomState::new().with("topic", "rust"))
        .unwrap();

    for ws in [&mut a, &mut b] {
        match recv(ws).await {
            ServerEvent::StateUpdated(state) => {
                assert_eq!(state.get("topic"), Some(&json!("rust")));
            }
            other => panic!("expected stateUpdated, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_message_updates_state_for_every_member() {
    let (addr, _registry) = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    join_or_create(&mut a, "board").await;
    join_or_create(&mut b, "board").await;

    a.send_message(json!({ "text": "hello" })).await.unwrap();

    for ws in [&mut a, &mut b] {
        assert_eq!(
            recv(ws).await,
            ServerEvent::StateUpdated(RoomState::new().with("log", json!(["hello"])).into_snapshot())
        );
    }
}

#[tokio::test]
async fn test_rejected_message_reports_error_to_sender_only() {
    let (addr, _registry) = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    join_or_create(&mut a, "board").await;
    join_or_create(&mut b, "board").await;

    a.send_message(json!({ "note": "no text" })).await.unwrap();

    assert_eq!(
        recv(&mut a).await,
        ServerEvent::Error {
            message: "message rejected: missing text".into()
        }
    );
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn test_join_room_by_id_missing_room_fails() {
    let (addr, _registry) = start_server().await;
    let mut ws = connect(&addr).await;

    ws.join_room_by_id("nowhere").await.unwrap();

    assert_eq!(
        recv(&mut ws).await,
        ServerEvent::JoinFailed(JoinFailure {
            room: "nowhere".into(),
            reason: "room nowhere not found".into(),
        })
    );
}

#[tokio::test]
async fn test_join_room_by_id_existing_room() {
    let (addr, registry) = start_server().await;
    registry
        .lock()
        .await
        .create_room("chat", RoomArgs::with_id("lobby"))
        .unwrap();
    let mut ws = connect(&addr).await;

    ws.join_room_by_id("lobby").await.unwrap();

    match recv(&mut ws).await {
        ServerEvent::JoinedRoom(view) => assert_eq!(view.id, RoomId::new("lobby")),
        other => panic!("expected joinedRoom, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_or_create_unknown_type_fails() {
    let (addr, _registry) = start_server().await;
    let mut ws = connect(&addr).await;

    ws.join_or_create_room("ghost").await.unwrap();

    match recv(&mut ws).await {
        ServerEvent::JoinFailed(failure) => {
            assert_eq!(failure.room, "ghost");
            assert_eq!(failure.reason, "unrecognized room type ghost");
        }
        other => panic!("expected joinFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_frame_reports_error_and_keeps_connection() {
    let (addr, _registry) = start_server().await;
    // The client only sends well-formed events, so write the bad frame raw.
    let (mut raw, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");

    let bad = json!({ "event": "teleport", "data": "mars" });
    raw.send(Message::text(bad.to_string())).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(5), raw.next())
        .await
        .expect("should receive within timeout")
        .expect("connection should stay open")
        .expect("frame should be readable");
    let reply: ServerEvent = serde_json::from_slice(&reply.into_data()).unwrap();
    match reply {
        ServerEvent::Error { message } => assert!(message.starts_with("invalid event")),
        other => panic!("expected error, got {other:?}"),
    }

    let join = json!({ "event": "joinOrCreateRoom", "data": "chat" });
    raw.send(Message::text(join.to_string())).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(5), raw.next())
        .await
        .expect("should receive within timeout")
        .expect("connection should stay open")
        .expect("frame should be readable");
    let reply: ServerEvent = serde_json::from_slice(&reply.into_data()).unwrap();
    assert!(matches!(reply, ServerEvent::JoinedRoom(view) if view.room_type == "chat"));
}

#[tokio::test]
async fn test_leave_room_stops_state_updates() {
    let (addr, registry) = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    let room = join_or_create(&mut a, "chat").await;
    join_or_create(&mut b, "chat").await;

    b.leave_room(room.id.clone()).await.unwrap();
    // Wait until the server has applied the leave.
    for _ in 0..50 {
        if registry.lock().await.get_room(&room.id).unwrap().member_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    registry
        .lock()
        .await
        .merge_room_state(&room.id, RoomState::new().with("n", 1))
        .unwrap();

    assert!(matches!(recv(&mut a).await, ServerEvent::StateUpdated(_)));
    assert_silent(&mut b).await;
}

#[tokio::test]
async fn test_disconnect_removes_client_from_rooms() {
    let (addr, registry) = start_server().await;
    let mut ws = connect(&addr).await;
    let room = join_or_create(&mut ws, "chat").await;

    ws.close().await.expect("close should succeed");

    let mut emptied = false;
    for _ in 0..50 {
        let registry = registry.lock().await;
        if registry.get_room(&room.id).unwrap().member_count() == 0 {
            assert_eq!(registry.transport().endpoint_count(), 0);
            emptied = true;
            break;
        }
        drop(registry);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(emptied, "client should have been removed on disconnect");
}
