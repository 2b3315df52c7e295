//! Presence directory and session lifecycle.
//!
//! DESIGN
//! ======
//! The directory maps user id to the session that currently speaks for that
//! user. Registration is last-write-wins: a second registration for the same
//! user silently supersedes the first without tearing down the earlier
//! connection. Disconnect removal is guarded by session id, so a superseded
//! session's exit never evicts the newer registration.
//!
//! Every successful mutation broadcasts the full roster to every registered
//! session, including the one that triggered the change. Lookup, mutation,
//! and broadcast happen inside a single write-lock critical section; two
//! racing registrations serialize, and no client ever receives a snapshot
//! that disagrees with the directory it was taken from.

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::state::{AppState, PresenceDirectory, PresenceEntry, PresenceUser};

/// Identity a connection acquires by registering.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub display_name: String,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Register a session as a user. Inserts or overwrites the user's entry,
/// drops the entry of a previous identity this session held, and broadcasts
/// one snapshot.
pub async fn register(
    state: &AppState,
    session_id: Uuid,
    identity: &Identity,
    tx: mpsc::Sender<Frame>,
    replaces: Option<i64>,
) {
    let mut directory = state.presence.write().await;

    // A session re-registering under a different user id abandons its old
    // identity; remove that entry only if this session still owns it.
    if let Some(old_user_id) = replaces {
        if old_user_id != identity.user_id {
            if directory
                .get(&old_user_id)
                .is_some_and(|entry| entry.session_id == session_id)
            {
                directory.remove(&old_user_id);
            }
        }
    }

    directory.insert(
        identity.user_id,
        PresenceEntry { session_id, display_name: identity.display_name.clone(), tx },
    );
    info!(user_id = identity.user_id, %session_id, online = directory.len(), "presence: registered");

    broadcast_snapshot(&directory);
}

/// Remove the entry a disconnecting session registered, if it still owns it.
/// Broadcasts a snapshot only when an entry was actually removed. A session
/// that never registered goes through the ws cleanup path without calling in
/// here at all.
pub async fn disconnect(state: &AppState, user_id: i64, session_id: Uuid) {
    let mut directory = state.presence.write().await;

    let owns_entry = directory
        .get(&user_id)
        .is_some_and(|entry| entry.session_id == session_id);
    if !owns_entry {
        // A newer session superseded this registration; leave it alone.
        return;
    }

    directory.remove(&user_id);
    info!(user_id, %session_id, online = directory.len(), "presence: removed");

    broadcast_snapshot(&directory);
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// The full roster, sorted by user id for deterministic payloads.
#[must_use]
pub fn snapshot(directory: &PresenceDirectory) -> Vec<PresenceUser> {
    let mut users: Vec<PresenceUser> = directory
        .iter()
        .map(|(user_id, entry)| PresenceUser { user_id: *user_id, display_name: entry.display_name.clone() })
        .collect();
    users.sort_by_key(|u| u.user_id);
    users
}

/// Emit the full roster to every registered session. Best-effort: a client
/// whose channel is full misses this snapshot and catches up on the next one.
fn broadcast_snapshot(directory: &PresenceDirectory) {
    let users = snapshot(directory);
    let mut data = Data::new();
    data.insert("users".into(), serde_json::to_value(&users).unwrap_or_default());
    let frame = Frame::request("presence:snapshot", data);

    for entry in directory.values() {
        let _ = entry.tx.try_send(frame.clone());
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
