//! WebSocket handler — session lifecycle and frame dispatch.
//!
//! DESIGN
//! ======
//! On upgrade, the connection gets a fresh session id and a `ConnCtx`
//! holding its optional registered identity; the identity lives on the
//! context struct, never on the transport. The handler then enters a
//! `select!` loop:
//! - Incoming client frames → parse + dispatch by event prefix
//! - Frames pushed by peers (snapshots, relayed messages) → forward
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `session_id`
//! 2. `session:register` → presence entry + snapshot broadcast
//! 3. `chat:send` → relay delivers via directory channels
//! 4. Close → guarded presence removal + snapshot broadcast if removed

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::services::presence::Identity;
use crate::services::relay::RelayError;
use crate::services::{presence, relay};
use crate::state::AppState;

// =============================================================================
// CONNECTION CONTEXT
// =============================================================================

/// Per-connection state: the session handle and whatever identity the
/// connection has registered. Threaded explicitly through dispatch.
struct ConnCtx {
    session_id: Uuid,
    registered: Option<Identity>,
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide what the sender's socket receives — handlers never write to the
/// socket directly.
enum Outcome {
    /// Send empty done to sender.
    Done,
    /// Frames already went out through directory channels; nothing for the
    /// socket beyond what its own channel will deliver.
    Relayed,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let mut ctx = ConnCtx { session_id: Uuid::new_v4(), registered: None };

    // Per-connection channel: snapshots and relayed messages arrive here.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(256);

    let welcome = Frame::request("session:connected", Data::new())
        .with_data("session_id", ctx.session_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(session_id = %ctx.session_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(&state, &mut ctx, &client_tx, &text).await;
                        for frame in replies {
                            if send_frame(&mut socket, &frame).await.is_err() {
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    // Transport disconnect is lifecycle, not an error: remove this session's
    // registration (if it still owns one) and let presence broadcast the
    // shrunken roster. A session that never registered has nothing to clean.
    if let Some(identity) = &ctx.registered {
        presence::disconnect(&state, identity.user_id, ctx.session_id).await;
    }
    info!(session_id = %ctx.session_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
///
/// This keeps the websocket transport concerns separate from frame handling,
/// so tests can exercise the register/send/disconnect flows end-to-end.
async fn process_inbound_text(
    state: &AppState,
    ctx: &mut ConnCtx,
    client_tx: &mpsc::Sender<Frame>,
    text: &str,
) -> Vec<Frame> {
    let mut req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(session_id = %ctx.session_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };

    // Stamp the registered identity as `from`; pre-registration frames stay
    // anonymous.
    req.from = ctx.registered.as_ref().map(|i| i.user_id.to_string());

    info!(session_id = %ctx.session_id, id = %req.id, event = %req.event, status = ?req.status, "ws: recv frame");

    let result = match req.prefix() {
        "session" => handle_session(state, ctx, client_tx, &req).await,
        "chat" => handle_chat(state, ctx, client_tx, &req).await,
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::Done) => vec![req.done()],
        Ok(Outcome::Relayed) => vec![],
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

async fn handle_session(
    state: &AppState,
    ctx: &mut ConnCtx,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, Frame> {
    let op = req.event.split_once(':').map_or("", |(_, op)| op);

    match op {
        "register" => {
            let Some(user_id) = req.data.get("user_id").and_then(serde_json::Value::as_i64) else {
                return Err(req.error("user_id required"));
            };
            let display_name = req
                .data
                .get("display_name")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .unwrap_or_default();
            if display_name.is_empty() {
                return Err(req.error("display_name required"));
            }

            let identity = Identity { user_id, display_name: display_name.to_string() };
            let replaces = ctx.registered.as_ref().map(|i| i.user_id);
            presence::register(state, ctx.session_id, &identity, client_tx.clone(), replaces).await;
            ctx.registered = Some(identity);

            Ok(Outcome::Done)
        }
        _ => Err(req.error(format!("unknown session op: {op}"))),
    }
}

// =============================================================================
// CHAT HANDLERS
// =============================================================================

async fn handle_chat(
    state: &AppState,
    ctx: &mut ConnCtx,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, Frame> {
    // A message from a session that never registered has no sender identity;
    // reject it instead of guessing.
    let Some(sender) = ctx.registered.clone() else {
        return Err(req.error_from(&RelayError::Unregistered));
    };

    let op = req.event.split_once(':').map_or("", |(_, op)| op);

    match op {
        "send" => {
            let Some(recipient_id) = req.data.get("recipient_id").and_then(serde_json::Value::as_i64) else {
                return Err(req.error("recipient_id required"));
            };
            let body = req
                .data
                .get("body")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .unwrap_or_default();
            if body.is_empty() {
                return Err(req.error("body required"));
            }

            match relay::route(state, &sender, client_tx, recipient_id, body).await {
                Ok(()) => Ok(Outcome::Relayed),
                Err(e) => Err(req.error_from(&e).with_data("recipient_id", recipient_id)),
            }
        }
        _ => Err(req.error(format!("unknown chat op: {op}"))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == crate::frame::Status::Error {
        let code = frame.data.get("code").and_then(|v| v.as_str()).unwrap_or("-");
        let message = frame.data.get("message").and_then(|v| v.as_str()).unwrap_or("-");
        warn!(id = %frame.id, event = %frame.event, code, message, "ws: send frame status=Error");
    } else {
        info!(id = %frame.id, event = %frame.event, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
