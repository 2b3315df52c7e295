use super::*;

fn registered_controller() -> ChatController {
    let mut controller = ChatController::new(1, "Alice");
    controller.on_connected();
    controller.on_registered();
    controller
}

fn incoming(sender_id: i64, name: &str, body: &str) -> Delivery {
    Delivery {
        sender_id,
        sender_display_name: name.into(),
        body: body.into(),
        recipient_id: None,
    }
}

fn echo(recipient_id: i64, body: &str) -> Delivery {
    Delivery {
        sender_id: 1,
        sender_display_name: "Alice".into(),
        body: body.into(),
        recipient_id: Some(recipient_id),
    }
}

fn history(sender_id: i64, name: &str, body: &str, ts: i64) -> HistoryMessage {
    HistoryMessage { sender_id, sender_display_name: name.into(), body: body.into(), ts }
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn starts_disconnected_and_walks_the_state_machine() {
    let mut controller = ChatController::new(1, "Alice");
    assert_eq!(controller.status(), ConnectionStatus::Disconnected);

    controller.on_connected();
    assert_eq!(controller.status(), ConnectionStatus::Connected);

    controller.on_registered();
    assert_eq!(controller.status(), ConnectionStatus::Registered);

    controller.on_disconnected();
    assert_eq!(controller.status(), ConnectionStatus::Disconnected);
}

#[test]
fn register_ack_before_connect_does_not_skip_states() {
    let mut controller = ChatController::new(1, "Alice");
    controller.on_registered();
    assert_eq!(controller.status(), ConnectionStatus::Disconnected);
}

#[test]
fn snapshot_and_delivery_are_ignored_until_registered() {
    let mut controller = ChatController::new(1, "Alice");
    controller.on_connected();

    controller.on_snapshot(vec![PresenceUser { user_id: 2, display_name: "Bob".into() }]);
    controller.on_delivery(&incoming(2, "Bob", "early"));

    assert!(controller.roster().is_empty());
    assert!(controller.transcript(2).is_empty());
}

// =============================================================
// Presence
// =============================================================

#[test]
fn snapshot_replaces_roster_and_drops_self() {
    let mut controller = registered_controller();

    controller.on_snapshot(vec![
        PresenceUser { user_id: 1, display_name: "Alice".into() },
        PresenceUser { user_id: 2, display_name: "Bob".into() },
    ]);
    assert_eq!(controller.roster().len(), 1);
    assert_eq!(controller.roster()[0].user_id, 2);

    // Next snapshot replaces wholesale, no merging.
    controller.on_snapshot(vec![PresenceUser { user_id: 1, display_name: "Alice".into() }]);
    assert!(controller.roster().is_empty());
}

#[test]
fn disconnect_clears_roster() {
    let mut controller = registered_controller();
    controller.on_snapshot(vec![PresenceUser { user_id: 2, display_name: "Bob".into() }]);

    controller.on_disconnected();
    assert!(controller.roster().is_empty());
}

// =============================================================
// Deliveries and unread flags
// =============================================================

#[test]
fn incoming_message_for_inactive_partner_sets_unread() {
    let mut controller = registered_controller();

    controller.on_delivery(&incoming(2, "Bob", "hi"));

    assert!(controller.has_unread(2));
    assert_eq!(controller.transcript(2).len(), 1);
    assert_eq!(controller.transcript(2)[0].direction, Direction::Received);
    assert_eq!(controller.transcript(2)[0].speaker, "Bob");
}

#[test]
fn incoming_message_for_active_partner_does_not_set_unread() {
    let mut controller = registered_controller();
    controller.open_conversation(2, Ok(vec![]));

    controller.on_delivery(&incoming(2, "Bob", "hi"));

    assert!(!controller.has_unread(2));
    assert_eq!(controller.transcript(2).len(), 1);
}

#[test]
fn echo_is_detected_solely_by_recipient_id_and_filed_under_recipient() {
    let mut controller = registered_controller();
    controller.open_conversation(2, Ok(vec![]));

    // Same sender fields as an incoming message; only recipient_id differs.
    controller.on_delivery(&echo(2, "hello bob"));

    let transcript = controller.transcript(2);
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].direction, Direction::Sent);
    assert_eq!(transcript[0].speaker, "Alice");
    assert_eq!(transcript[0].body, "hello bob");
    // Nothing landed under the sender's own id.
    assert!(controller.transcript(1).is_empty());
}

#[test]
fn delivery_for_other_partner_leaves_active_transcript_untouched() {
    let mut controller = registered_controller();
    controller.open_conversation(2, Ok(vec![]));

    controller.on_delivery(&incoming(3, "Carol", "psst"));

    assert!(controller.transcript(2).is_empty());
    assert_eq!(controller.transcript(3).len(), 1);
    assert!(controller.has_unread(3));
    assert!(!controller.has_unread(2));
}

#[test]
fn recipient_offline_notice_lands_in_that_conversation() {
    let mut controller = registered_controller();
    controller.open_conversation(2, Ok(vec![]));

    controller.on_recipient_offline(2);

    let transcript = controller.transcript(2);
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].direction, Direction::Notice);
    assert!(transcript[0].body.contains("offline"));
}

// =============================================================
// Conversation open and history merge
// =============================================================

#[test]
fn open_conversation_discards_cache_and_rebuilds_from_history() {
    let mut controller = registered_controller();

    // Live traffic cached while the conversation was closed...
    controller.on_delivery(&incoming(2, "Bob", "live message"));
    assert!(controller.has_unread(2));

    // ...is replaced by the history result on open: the relay never wrote
    // it to the store, so it is gone.
    controller.open_conversation(
        2,
        Ok(vec![
            history(1, "Alice", "old outgoing", 1_000),
            history(2, "Bob", "old incoming", 2_000),
        ]),
    );

    let transcript = controller.transcript(2);
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].direction, Direction::Sent);
    assert_eq!(transcript[0].body, "old outgoing");
    assert_eq!(transcript[1].direction, Direction::Received);
    assert_eq!(transcript[1].speaker, "Bob");
    assert!(!controller.has_unread(2));
    assert_eq!(controller.active_partner(), Some(2));
    assert!(controller.banner().is_none());
}

#[test]
fn live_deliveries_append_after_history() {
    let mut controller = registered_controller();
    controller.open_conversation(2, Ok(vec![history(2, "Bob", "earlier", 1_000)]));

    controller.on_delivery(&incoming(2, "Bob", "and now"));

    let transcript = controller.transcript(2);
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].body, "and now");
}

#[test]
fn history_fetch_failure_shows_banner_but_keeps_conversation_usable() {
    let mut controller = registered_controller();

    controller.open_conversation(2, Err(ApiError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)));

    assert!(controller.banner().is_some());
    assert!(controller.transcript(2).is_empty());

    // Live messages still flow into the open conversation.
    controller.on_delivery(&incoming(2, "Bob", "still works"));
    assert_eq!(controller.transcript(2).len(), 1);
    assert!(!controller.has_unread(2));

    // A later successful open clears the banner.
    controller.open_conversation(2, Ok(vec![]));
    assert!(controller.banner().is_none());
}

#[test]
fn reopening_clears_unread_even_when_history_is_empty() {
    let mut controller = registered_controller();
    controller.on_delivery(&incoming(2, "Bob", "ping"));
    assert!(controller.has_unread(2));

    controller.open_conversation(2, Ok(vec![]));
    assert!(!controller.has_unread(2));
    assert!(controller.transcript(2).is_empty());
}
