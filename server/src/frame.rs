//! Frame — the single envelope for everything on the chat socket.
//!
//! ARCHITECTURE
//! ============
//! Clients send `request` frames; the gateway dispatches on the event
//! prefix ("session:", "chat:") and answers each request with one `done`
//! or `error` frame correlated through `parent_id`. Traffic the server
//! originates on its own — presence snapshots, relayed messages — is a
//! `request` frame with no parent that never gets a reply.
//!
//! The payload is one flat JSON object. Dispatch never looks inside it;
//! only the handler for an event interprets its keys.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flat key-value payload of a frame.
pub type Data = HashMap<String, serde_json::Value>;

/// Where a frame sits in an exchange: the opening request, or one of the
/// two terminal replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Request,
    Done,
    Error,
}

impl Status {
    /// Whether this frame ends its exchange.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Error)
    }
}

/// Typed errors that cross the wire carry a stable, grepable code next to
/// their human-readable message.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// The envelope itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    /// Milliseconds since the Unix epoch, stamped at construction.
    pub ts: i64,
    /// User id of the originating session, once it has registered.
    pub from: Option<String>,
    pub event: String,
    pub status: Status,
    pub data: Data,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |dur| i64::try_from(dur.as_millis()).unwrap_or(0))
}

impl Frame {
    /// Open an exchange (or carry a server-initiated event).
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

    /// Successful empty reply to this frame.
    #[must_use]
    pub fn done(&self) -> Self {
        self.reply(Status::Done, Data::new())
    }

    /// Error reply carrying only a message.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> Self {
        let mut data = Data::new();
        data.insert("message".into(), serde_json::Value::String(message.into()));
        self.reply(Status::Error, data)
    }

    /// Error reply built from a typed error: code, message, retryable.
    #[must_use]
    pub fn error_from(&self, err: &(impl ErrorCode + ?Sized)) -> Self {
        let mut data = Data::new();
        data.insert("code".into(), serde_json::Value::String(err.error_code().to_string()));
        data.insert("message".into(), serde_json::Value::String(err.to_string()));
        data.insert("retryable".into(), serde_json::Value::Bool(err.retryable()));
        self.reply(Status::Error, data)
    }

    fn reply(&self, status: Status, data: Data) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: Some(self.id),
            ts: now_ms(),
            from: None,
            event: self.event.clone(),
            status,
            data,
        }
    }

    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// The event's dispatch prefix: everything before the first ':', or the
    /// whole event when there is none.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.event.split_once(':').map_or(self.event.as_str(), |(prefix, _)| prefix)
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
