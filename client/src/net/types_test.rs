use super::*;

fn frame_from_json(json: serde_json::Value) -> Frame {
    serde_json::from_value(json).expect("frame should parse")
}

#[test]
fn parses_server_snapshot_frame() {
    let frame = frame_from_json(serde_json::json!({
        "id": Uuid::new_v4(),
        "parent_id": null,
        "ts": 1_700_000_000_000_i64,
        "from": null,
        "event": "presence:snapshot",
        "status": "request",
        "data": { "users": [
            { "user_id": 1, "display_name": "Alice" },
            { "user_id": 2, "display_name": "Bob" },
        ]},
    }));

    let users = frame.as_snapshot().expect("snapshot view");
    assert_eq!(users.len(), 2);
    assert_eq!(users[0], PresenceUser { user_id: 1, display_name: "Alice".into() });
}

#[test]
fn delivery_without_recipient_id_is_incoming() {
    let frame = frame_from_json(serde_json::json!({
        "id": Uuid::new_v4(),
        "parent_id": null,
        "ts": 0,
        "from": "1",
        "event": "chat:message",
        "status": "request",
        "data": { "sender_id": 1, "sender_display_name": "Alice", "body": "hi" },
    }));

    let delivery = frame.as_delivery().expect("delivery view");
    assert!(!delivery.is_echo());
    assert_eq!(delivery.sender_id, 1);
    assert_eq!(delivery.body, "hi");
}

#[test]
fn delivery_with_recipient_id_is_echo() {
    let frame = frame_from_json(serde_json::json!({
        "id": Uuid::new_v4(),
        "parent_id": null,
        "ts": 0,
        "from": "1",
        "event": "chat:message",
        "status": "request",
        "data": { "sender_id": 1, "sender_display_name": "Alice", "body": "hi", "recipient_id": 2 },
    }));

    let delivery = frame.as_delivery().expect("delivery view");
    assert!(delivery.is_echo());
    assert_eq!(delivery.recipient_id, Some(2));
}

#[test]
fn recipient_offline_view_matches_error_code_only() {
    let offline = frame_from_json(serde_json::json!({
        "id": Uuid::new_v4(),
        "parent_id": Uuid::new_v4(),
        "ts": 0,
        "from": null,
        "event": "chat:send",
        "status": "error",
        "data": { "code": "E_RECIPIENT_OFFLINE", "message": "recipient 2 is not connected",
                  "retryable": false, "recipient_id": 2 },
    }));
    assert_eq!(offline.as_recipient_offline(), Some(2));

    let other_error = frame_from_json(serde_json::json!({
        "id": Uuid::new_v4(),
        "parent_id": Uuid::new_v4(),
        "ts": 0,
        "from": null,
        "event": "chat:send",
        "status": "error",
        "data": { "code": "E_UNREGISTERED", "message": "session has not registered", "retryable": false },
    }));
    assert_eq!(other_error.as_recipient_offline(), None);
}

#[test]
fn outbound_constructors_fill_payloads() {
    let reg = register_frame(7, "Gus");
    assert_eq!(reg.event, "session:register");
    assert_eq!(reg.status, Status::Request);
    assert_eq!(reg.data.get("user_id").and_then(serde_json::Value::as_i64), Some(7));
    assert_eq!(reg.data.get("display_name").and_then(|v| v.as_str()), Some("Gus"));

    let send = send_frame(2, "hello");
    assert_eq!(send.event, "chat:send");
    assert_eq!(send.data.get("recipient_id").and_then(serde_json::Value::as_i64), Some(2));
    assert_eq!(send.data.get("body").and_then(|v| v.as_str()), Some("hello"));
}

#[test]
fn register_ack_requires_done_status() {
    let reg = register_frame(7, "Gus");
    assert!(!reg.is_register_ack());

    let ack = frame_from_json(serde_json::json!({
        "id": Uuid::new_v4(),
        "parent_id": reg.id,
        "ts": 0,
        "from": null,
        "event": "session:register",
        "status": "done",
        "data": {},
    }));
    assert!(ack.is_register_ack());
}
