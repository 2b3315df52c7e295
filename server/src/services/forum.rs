//! Forum service — posts, comments, and the like toggle.
//!
//! DESIGN
//! ======
//! The like toggle is a conditional write pair: insert-if-absent, and when
//! nothing was inserted, delete. The composite primary key on likes makes
//! both halves idempotent; two racing toggles serialize on the key instead
//! of one of them swallowing a duplicate-entry failure.

use sqlx::PgPool;
use tracing::info;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Post with author name and like count, as listed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub content: String,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
    pub like_count: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CommentRow {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub content: String,
    pub created_at: i64,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

// =============================================================================
// POSTS
// =============================================================================

/// Create a post and return its id.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create_post(pool: &PgPool, user_id: i64, content: &str) -> Result<i64, ForumError> {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO posts (user_id, content) VALUES ($1, $2) RETURNING id")
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await?;

    info!(post_id = id, user_id, "forum: post created");
    Ok(id)
}

const POST_COLUMNS: &str = "p.id,
            p.user_id,
            u.name,
            p.content,
            (EXTRACT(EPOCH FROM p.created_at) * 1000)::BIGINT,
            (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id)";

/// List all posts, newest first, with author name and like count.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_posts(pool: &PgPool) -> Result<Vec<PostRow>, ForumError> {
    let rows = sqlx::query_as::<_, (i64, i64, String, String, i64, i64)>(&format!(
        "SELECT {POST_COLUMNS}
         FROM posts p
         JOIN users u ON u.id = p.user_id
         ORDER BY p.created_at DESC, p.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(post_row).collect())
}

/// List one user's posts, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_user_posts(pool: &PgPool, user_id: i64) -> Result<Vec<PostRow>, ForumError> {
    let rows = sqlx::query_as::<_, (i64, i64, String, String, i64, i64)>(&format!(
        "SELECT {POST_COLUMNS}
         FROM posts p
         JOIN users u ON u.id = p.user_id
         WHERE p.user_id = $1
         ORDER BY p.created_at DESC, p.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(post_row).collect())
}

fn post_row((id, user_id, user_name, content, created_at, like_count): (i64, i64, String, String, i64, i64)) -> PostRow {
    PostRow { id, user_id, user_name, content, created_at, like_count }
}

async fn post_exists(pool: &PgPool, post_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(pool)
        .await
}

// =============================================================================
// COMMENTS
// =============================================================================

/// List a post's comments, oldest first.
///
/// # Errors
///
/// Returns [`ForumError::PostNotFound`] when the post does not exist.
pub async fn list_comments(pool: &PgPool, post_id: i64) -> Result<Vec<CommentRow>, ForumError> {
    if !post_exists(pool, post_id).await? {
        return Err(ForumError::PostNotFound(post_id));
    }

    let rows = sqlx::query_as::<_, (i64, i64, String, String, i64)>(
        "SELECT c.id,
                c.user_id,
                u.name,
                c.content,
                (EXTRACT(EPOCH FROM c.created_at) * 1000)::BIGINT
         FROM comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.post_id = $1
         ORDER BY c.created_at ASC, c.id ASC",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, user_id, user_name, content, created_at)| CommentRow {
            id,
            user_id,
            user_name,
            content,
            created_at,
        })
        .collect())
}

/// Add a comment and return its id.
///
/// # Errors
///
/// Returns [`ForumError::PostNotFound`] when the post does not exist.
pub async fn create_comment(
    pool: &PgPool,
    post_id: i64,
    user_id: i64,
    content: &str,
) -> Result<i64, ForumError> {
    if !post_exists(pool, post_id).await? {
        return Err(ForumError::PostNotFound(post_id));
    }

    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO comments (post_id, user_id, content) VALUES ($1, $2, $3) RETURNING id")
            .bind(post_id)
            .bind(user_id)
            .bind(content)
            .fetch_one(pool)
            .await?;

    Ok(id)
}

// =============================================================================
// LIKES
// =============================================================================

/// Toggle a user's like on a post: like if absent, unlike if present.
///
/// # Errors
///
/// Returns [`ForumError::PostNotFound`] when the post does not exist.
pub async fn toggle_like(pool: &PgPool, post_id: i64, user_id: i64) -> Result<LikeState, ForumError> {
    if !post_exists(pool, post_id).await? {
        return Err(ForumError::PostNotFound(post_id));
    }

    let inserted = sqlx::query("INSERT INTO likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if inserted.rows_affected() > 0 {
        info!(post_id, user_id, "forum: liked");
        return Ok(LikeState::Liked);
    }

    sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    info!(post_id, user_id, "forum: unliked");
    Ok(LikeState::Unliked)
}

#[cfg(test)]
#[path = "forum_test.rs"]
mod tests;
