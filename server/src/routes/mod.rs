//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router binds the REST surface (accounts, forum, chat history)
//! and the WebSocket gateway. CORS is wide open, same as the original
//! deployment behind a separate frontend origin.

pub mod chat;
pub mod forum;
pub mod users;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/users", post(users::create_user).get(users::list_users))
        .route(
            "/api/users/{id}",
            patch(users::update_user).delete(users::delete_user),
        )
        .route("/api/users/{id}/posts", get(forum::list_user_posts))
        .route("/api/login", post(users::login))
        .route("/api/posts", post(forum::create_post).get(forum::list_posts))
        .route(
            "/api/posts/{id}/comments",
            get(forum::list_comments).post(forum::create_comment),
        )
        .route("/api/posts/{id}/like", put(forum::toggle_like))
        .route("/api/chat/history/{a}/{b}", get(chat::get_history))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
