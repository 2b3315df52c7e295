use super::*;

#[tokio::test]
async fn new_state_has_empty_directory() {
    let state = test_helpers::test_app_state();
    let directory = state.presence.read().await;
    assert!(directory.is_empty());
}

#[tokio::test]
async fn seeded_user_is_visible_in_directory() {
    let state = test_helpers::test_app_state();
    let (session_id, _rx) = test_helpers::seed_online_user(&state, 1, "Alice").await;

    let directory = state.presence.read().await;
    let entry = directory.get(&1).expect("entry should exist");
    assert_eq!(entry.session_id, session_id);
    assert_eq!(entry.display_name, "Alice");
}

#[test]
fn presence_user_serializes_flat() {
    let user = PresenceUser { user_id: 3, display_name: "Carol".into() };
    let json = serde_json::to_value(&user).expect("serialize");
    assert_eq!(json.get("user_id").and_then(serde_json::Value::as_i64), Some(3));
    assert_eq!(json.get("display_name").and_then(|v| v.as_str()), Some("Carol"));
}
