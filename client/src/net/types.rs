//! Client-side frame types.
//!
//! The client keeps its own mirror of the server's frame envelope rather
//! than sharing a crate; the wire contract is the JSON shape, not a Rust
//! type. Typed views over the handful of server events the controller
//! cares about live here too, so the rest of the client never digs through
//! raw payload maps.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flat key-value payload.
pub type Data = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Request,
    Done,
    Error,
}

/// Mirror of the server's universal message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub ts: i64,
    pub from: Option<String>,
    pub event: String,
    pub status: Status,
    pub data: Data,
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a request frame.
    pub fn request(event: impl Into<String>, data: Data) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: None,
            ts: now_ms(),
            from: None,
            event: event.into(),
            status: Status::Request,
            data,
        }
    }
}

// =============================================================================
// OUTBOUND CONSTRUCTORS
// =============================================================================

/// Announce identity after connecting. The display name comes from login;
/// the server does not resolve it.
#[must_use]
pub fn register_frame(user_id: i64, display_name: &str) -> Frame {
    let mut data = Data::new();
    data.insert("user_id".into(), serde_json::json!(user_id));
    data.insert("display_name".into(), serde_json::json!(display_name));
    Frame::request("session:register", data)
}

/// Send one private message.
#[must_use]
pub fn send_frame(recipient_id: i64, body: &str) -> Frame {
    let mut data = Data::new();
    data.insert("recipient_id".into(), serde_json::json!(recipient_id));
    data.insert("body".into(), serde_json::json!(body));
    Frame::request("chat:send", data)
}

// =============================================================================
// INBOUND VIEWS
// =============================================================================

/// One roster row from a presence snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresenceUser {
    pub user_id: i64,
    pub display_name: String,
}

/// A relayed message. `recipient_id` is present only on the sender's own
/// echo; its presence is the sole marker separating "mine" from "theirs".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub sender_id: i64,
    pub sender_display_name: String,
    pub body: String,
    pub recipient_id: Option<i64>,
}

impl Delivery {
    #[must_use]
    pub fn is_echo(&self) -> bool {
        self.recipient_id.is_some()
    }
}

/// One message from a history query, as served by the REST endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub sender_id: i64,
    pub sender_display_name: String,
    pub body: String,
    pub ts: i64,
}

impl Frame {
    /// View a `presence:snapshot` frame as a roster.
    #[must_use]
    pub fn as_snapshot(&self) -> Option<Vec<PresenceUser>> {
        if self.event != "presence:snapshot" {
            return None;
        }
        let users = self.data.get("users")?;
        serde_json::from_value(users.clone()).ok()
    }

    /// View a `chat:message` frame as a delivery.
    #[must_use]
    pub fn as_delivery(&self) -> Option<Delivery> {
        if self.event != "chat:message" {
            return None;
        }
        Some(Delivery {
            sender_id: self.data.get("sender_id").and_then(serde_json::Value::as_i64)?,
            sender_display_name: self
                .data
                .get("sender_display_name")
                .and_then(|v| v.as_str())?
                .to_string(),
            body: self.data.get("body").and_then(|v| v.as_str())?.to_string(),
            recipient_id: self.data.get("recipient_id").and_then(serde_json::Value::as_i64),
        })
    }

    /// View an error reply as a recipient-offline notice.
    #[must_use]
    pub fn as_recipient_offline(&self) -> Option<i64> {
        if self.status != Status::Error {
            return None;
        }
        if self.data.get("code").and_then(|v| v.as_str()) != Some("E_RECIPIENT_OFFLINE") {
            return None;
        }
        self.data.get("recipient_id").and_then(serde_json::Value::as_i64)
    }

    /// True for the done reply acknowledging a `session:register`.
    #[must_use]
    pub fn is_register_ack(&self) -> bool {
        self.event == "session:register" && self.status == Status::Done
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
