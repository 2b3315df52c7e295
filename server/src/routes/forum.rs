//! Forum routes — posts, comments, likes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::services::forum::{self, CommentRow, ForumError, LikeState, PostRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreatePostBody {
    pub user_id: i64,
    pub content: String,
}

#[derive(Deserialize)]
pub struct CreateCommentBody {
    pub user_id: i64,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ToggleLikeBody {
    pub user_id: i64,
}

/// `POST /api/posts` — create a post.
pub async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<CreatePostBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    if body.content.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let id = forum::create_post(&state.pool, body.user_id, body.content.trim())
        .await
        .map_err(forum_error_to_status)?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// `GET /api/posts` — list all posts, newest first.
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostRow>>, StatusCode> {
    let posts = forum::list_posts(&state.pool)
        .await
        .map_err(forum_error_to_status)?;
    Ok(Json(posts))
}

/// `GET /api/users/:id/posts` — list one user's posts.
pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<PostRow>>, StatusCode> {
    let posts = forum::list_user_posts(&state.pool, user_id)
        .await
        .map_err(forum_error_to_status)?;
    Ok(Json(posts))
}

/// `GET /api/posts/:id/comments` — list a post's comments, oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<CommentRow>>, StatusCode> {
    let comments = forum::list_comments(&state.pool, post_id)
        .await
        .map_err(forum_error_to_status)?;
    Ok(Json(comments))
}

/// `POST /api/posts/:id/comments` — add a comment.
pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(body): Json<CreateCommentBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    if body.content.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let id = forum::create_comment(&state.pool, post_id, body.user_id, body.content.trim())
        .await
        .map_err(forum_error_to_status)?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// `PUT /api/posts/:id/like` — idempotent like toggle.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(body): Json<ToggleLikeBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let liked = forum::toggle_like(&state.pool, post_id, body.user_id)
        .await
        .map_err(forum_error_to_status)?;

    Ok(Json(serde_json::json!({ "liked": liked == LikeState::Liked })))
}

pub(crate) fn forum_error_to_status(err: ForumError) -> StatusCode {
    match err {
        ForumError::PostNotFound(_) => StatusCode::NOT_FOUND,
        ForumError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
