//! Conversation state machine.
//!
//! DESIGN
//! ======
//! The controller is sans-IO: the connection loop feeds it parsed frames
//! and already-fetched history results, and the terminal renders from its
//! accessors. One transcript cache per partner; opening a conversation
//! discards that partner's cache and rebuilds it from the history store, so
//! live messages that arrived while the view was closed survive only until
//! the next open (the history store never sees relayed traffic).
//!
//! LIFECYCLE
//! =========
//! `Disconnected → Connected → Registered`. Snapshots and deliveries are
//! ignored until the register ack arrives; the server does not send them
//! earlier anyway.

use std::collections::{HashMap, HashSet};

use crate::net::api::ApiError;
use crate::net::types::{Delivery, HistoryMessage, PresenceUser};

// =============================================================================
// TYPES
// =============================================================================

/// WebSocket connection status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
    Registered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
    Notice,
}

/// One rendered line of a conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub direction: Direction,
    pub speaker: String,
    pub body: String,
}

/// Per-client chat state: roster, transcripts, unread flags.
#[derive(Debug, Default)]
pub struct ChatController {
    self_id: i64,
    display_name: String,
    status: ConnectionStatus,
    roster: Vec<PresenceUser>,
    transcripts: HashMap<i64, Vec<TranscriptEntry>>,
    unread: HashSet<i64>,
    active_partner: Option<i64>,
    /// Set when the last history fetch failed; the conversation stays
    /// usable for live messages.
    banner: Option<String>,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

impl ChatController {
    #[must_use]
    pub fn new(self_id: i64, display_name: impl Into<String>) -> Self {
        Self { self_id, display_name: display_name.into(), ..Self::default() }
    }

    pub fn on_connected(&mut self) {
        self.status = ConnectionStatus::Connected;
    }

    /// Called when the register ack arrives.
    pub fn on_registered(&mut self) {
        if self.status == ConnectionStatus::Connected {
            self.status = ConnectionStatus::Registered;
        }
    }

    pub fn on_disconnected(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.roster.clear();
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }
}

// =============================================================================
// PRESENCE
// =============================================================================

impl ChatController {
    /// Replace the roster with a fresh snapshot. The own entry is dropped;
    /// the list renders chat partners, not the viewer.
    pub fn on_snapshot(&mut self, users: Vec<PresenceUser>) {
        if self.status != ConnectionStatus::Registered {
            return;
        }
        self.roster = users.into_iter().filter(|u| u.user_id != self.self_id).collect();
    }

    #[must_use]
    pub fn roster(&self) -> &[PresenceUser] {
        &self.roster
    }
}

// =============================================================================
// DELIVERIES
// =============================================================================

impl ChatController {
    /// Fold one relayed message into the matching partner's cache. A message
    /// for an inactive conversation flips that partner's unread flag.
    pub fn on_delivery(&mut self, delivery: &Delivery) {
        if self.status != ConnectionStatus::Registered {
            return;
        }

        // The recipient_id marker means this is our own message echoed back;
        // the conversation it belongs to is the recipient's, not ours.
        let (partner_id, entry) = match delivery.recipient_id {
            Some(recipient_id) => (
                recipient_id,
                TranscriptEntry {
                    direction: Direction::Sent,
                    speaker: self.display_name.clone(),
                    body: delivery.body.clone(),
                },
            ),
            None => (
                delivery.sender_id,
                TranscriptEntry {
                    direction: Direction::Received,
                    speaker: delivery.sender_display_name.clone(),
                    body: delivery.body.clone(),
                },
            ),
        };

        self.transcripts.entry(partner_id).or_default().push(entry);

        if self.active_partner != Some(partner_id) {
            self.unread.insert(partner_id);
        }
    }

    /// Note a failed send in the active conversation.
    pub fn on_recipient_offline(&mut self, recipient_id: i64) {
        self.transcripts.entry(recipient_id).or_default().push(TranscriptEntry {
            direction: Direction::Notice,
            speaker: String::new(),
            body: format!("user {recipient_id} is offline; message not delivered"),
        });
    }
}

// =============================================================================
// CONVERSATIONS
// =============================================================================

impl ChatController {
    /// Open (or reopen) a conversation: discard the cached transcript,
    /// install the history result, clear the unread flag. On a fetch
    /// failure the transcript starts empty behind a banner and still
    /// accepts live deliveries.
    pub fn open_conversation(&mut self, partner_id: i64, history: Result<Vec<HistoryMessage>, ApiError>) {
        self.active_partner = Some(partner_id);
        self.unread.remove(&partner_id);
        self.banner = None;

        let transcript = match history {
            Ok(messages) => messages.into_iter().map(|m| self.history_entry(&m)).collect(),
            Err(e) => {
                self.banner = Some(format!("could not load history: {e}"));
                Vec::new()
            }
        };
        self.transcripts.insert(partner_id, transcript);
    }

    fn history_entry(&self, message: &HistoryMessage) -> TranscriptEntry {
        if message.sender_id == self.self_id {
            TranscriptEntry {
                direction: Direction::Sent,
                speaker: self.display_name.clone(),
                body: message.body.clone(),
            }
        } else {
            TranscriptEntry {
                direction: Direction::Received,
                speaker: message.sender_display_name.clone(),
                body: message.body.clone(),
            }
        }
    }

    #[must_use]
    pub fn active_partner(&self) -> Option<i64> {
        self.active_partner
    }

    #[must_use]
    pub fn transcript(&self, partner_id: i64) -> &[TranscriptEntry] {
        self.transcripts.get(&partner_id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn has_unread(&self, partner_id: i64) -> bool {
        self.unread.contains(&partner_id)
    }

    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    #[must_use]
    pub fn self_id(&self) -> i64 {
        self.self_id
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;
