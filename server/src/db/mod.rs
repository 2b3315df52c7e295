//! Database pool setup.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything persisted — accounts, posts, comments, likes, and the private
//! message history — lives in Postgres behind one shared pool. Startup runs
//! the embedded migrations before the listener binds, so no request ever
//! sees a partial schema.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Build the shared pool and bring the schema up to date.
///
/// Pool size comes from `DB_MAX_CONNECTIONS` (default 5). The chat path
/// holds connections only for history queries; the REST surface accounts
/// for the rest.
///
/// # Errors
///
/// Returns an error when the database is unreachable or a migration fails.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_connections = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    info!(max_connections, "database ready");

    Ok(pool)
}
