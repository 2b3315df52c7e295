//! Message relay — point-to-point delivery through the presence directory.
//!
//! DESIGN
//! ======
//! A relayed message produces exactly two frames when the recipient is
//! online: one `chat:message` to the recipient, and one to the sending
//! connection carrying an extra `recipient_id` key. That key is the only
//! marker a client uses to tell its own echoed message apart from an
//! incoming one. When the recipient is offline, the dispatch layer turns
//! the returned error into a single error reply for the sender; nobody
//! else hears anything.
//!
//! Delivery is at-most-once: no persistence, no message ids, no ack beyond
//! the echo, no retry. The recipient lookup and both sends happen under one
//! read lock, so routing never interleaves with a register or disconnect.

use tokio::sync::mpsc;
use tracing::info;

use crate::frame::{Data, ErrorCode, Frame};
use crate::services::presence::Identity;
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("recipient {0} is not connected")]
    RecipientOffline(i64),
    #[error("session has not registered")]
    Unregistered,
}

impl ErrorCode for RelayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RecipientOffline(_) => "E_RECIPIENT_OFFLINE",
            Self::Unregistered => "E_UNREGISTERED",
        }
    }
}

// =============================================================================
// ROUTING
// =============================================================================

/// Route one message from a registered sender to a recipient.
///
/// The echo goes to `sender_tx`, the sending connection's own channel, not
/// to the directory entry for the sender's user id — a superseded session
/// still gets its own echo rather than leaking it to the newer session.
///
/// # Errors
///
/// Returns [`RelayError::RecipientOffline`] when the recipient has no
/// presence entry.
pub async fn route(
    state: &AppState,
    sender: &Identity,
    sender_tx: &mpsc::Sender<Frame>,
    recipient_id: i64,
    body: &str,
) -> Result<(), RelayError> {
    let directory = state.presence.read().await;

    let Some(recipient) = directory.get(&recipient_id) else {
        return Err(RelayError::RecipientOffline(recipient_id));
    };

    let mut data = Data::new();
    data.insert("sender_id".into(), serde_json::json!(sender.user_id));
    data.insert("sender_display_name".into(), serde_json::json!(sender.display_name));
    data.insert("body".into(), serde_json::json!(body));

    let delivery = Frame::request("chat:message", data).with_from(sender.user_id.to_string());
    let echo = delivery.clone().with_data("recipient_id", recipient_id);

    // Best-effort sends: a full channel drops that copy, same as the
    // snapshot broadcast.
    let _ = recipient.tx.try_send(delivery);
    let _ = sender_tx.try_send(echo);

    info!(sender_id = sender.user_id, recipient_id, "relay: delivered");
    Ok(())
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
