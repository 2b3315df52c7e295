//! Chat history route — the query side of the history store.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use tracing::error;

use crate::services::history::{self, HistoryMessage};
use crate::state::AppState;

/// `GET /api/chat/history/:a/:b` — the conversation between two users,
/// oldest first, both directions of the pair.
pub async fn get_history(
    State(state): State<AppState>,
    Path((user_a, user_b)): Path<(i64, i64)>,
) -> Result<Json<Vec<HistoryMessage>>, StatusCode> {
    let messages = history::query(&state.pool, user_a, user_b)
        .await
        .map_err(|e| {
            error!(error = %e, user_a, user_b, "history query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(messages))
}
