//! Chat history store — the persisted, queryable log of private messages.
//!
//! DESIGN
//! ======
//! History is read-only from the chat path: the relay never writes here, so
//! a message delivered while its conversation view was closed cannot be
//! recovered once that view reloads. Queries match both directions of a
//! user pair and come back ascending by creation time, then row id, which
//! preserves arrival order for messages stamped in the same millisecond.

use sqlx::PgPool;
use tracing::info;

// =============================================================================
// TYPES
// =============================================================================

/// One persisted message, with the sender's display name joined in.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryMessage {
    pub sender_id: i64,
    pub sender_display_name: String,
    pub body: String,
    /// Milliseconds since Unix epoch.
    pub ts: i64,
}

// =============================================================================
// QUERY
// =============================================================================

/// Fetch the conversation between two users, oldest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn query(pool: &PgPool, user_a: i64, user_b: i64) -> Result<Vec<HistoryMessage>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String, String, i64)>(
        "SELECT m.sender_id,
                u.name,
                m.body,
                (EXTRACT(EPOCH FROM m.created_at) * 1000)::BIGINT
         FROM private_messages m
         JOIN users u ON u.id = m.sender_id
         WHERE (m.sender_id = $1 AND m.recipient_id = $2)
            OR (m.sender_id = $2 AND m.recipient_id = $1)
         ORDER BY m.created_at ASC, m.id ASC",
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_all(pool)
    .await?;

    info!(user_a, user_b, count = rows.len(), "history: queried conversation");

    Ok(rows
        .into_iter()
        .map(|(sender_id, sender_display_name, body, ts)| HistoryMessage {
            sender_id,
            sender_display_name,
            body,
            ts,
        })
        .collect())
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
