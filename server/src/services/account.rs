//! Account service — registration, login, and profile CRUD.
//!
//! Passwords are stored as salted SHA-256 digests; the salt is a fresh
//! random 16-byte hex string per account. Email uniqueness is enforced by
//! a conditional insert, not by inspecting a constraint-violation error.

use std::fmt::Write;

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("user not found: {0}")]
    NotFound(i64),
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Public user row. Never carries credential material.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
}

// =============================================================================
// HASHING
// =============================================================================

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a random 16-byte hex salt.
#[must_use]
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Salted SHA-256 digest of a password, hex-encoded.
#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

// =============================================================================
// CRUD
// =============================================================================

/// Create an account.
///
/// # Errors
///
/// Returns [`AccountError::EmailTaken`] when the email is already registered,
/// or a database error.
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<UserRow, AccountError> {
    let salt = generate_salt();
    let hash = hash_password(password, &salt);

    let inserted = sqlx::query_as::<_, (i64,)>(
        "INSERT INTO users (name, email, password_salt, password_hash)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(&salt)
    .bind(&hash)
    .fetch_optional(pool)
    .await?;

    let Some((id,)) = inserted else {
        return Err(AccountError::EmailTaken);
    };

    Ok(UserRow { id, name: name.to_string(), email: email.to_string() })
}

/// Verify credentials and return the account.
///
/// # Errors
///
/// Returns [`AccountError::InvalidCredentials`] for an unknown email or a
/// wrong password; the caller cannot tell the two apart.
pub async fn verify_login(pool: &PgPool, email: &str, password: &str) -> Result<UserRow, AccountError> {
    let row = sqlx::query_as::<_, (i64, String, String, String)>(
        "SELECT id, name, password_salt, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let Some((id, name, salt, stored_hash)) = row else {
        return Err(AccountError::InvalidCredentials);
    };

    if hash_password(password, &salt) != stored_hash {
        return Err(AccountError::InvalidCredentials);
    }

    Ok(UserRow { id, name, email: email.to_string() })
}

/// List all accounts.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRow>, AccountError> {
    let rows = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, name, email FROM users ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, email)| UserRow { id, name, email })
        .collect())
}

/// Update name, email, and optionally the password.
///
/// # Errors
///
/// Returns [`AccountError::NotFound`] when no such user exists.
pub async fn update_user(
    pool: &PgPool,
    user_id: i64,
    name: &str,
    email: &str,
    password: Option<&str>,
) -> Result<UserRow, AccountError> {
    let result = if let Some(password) = password {
        let salt = generate_salt();
        let hash = hash_password(password, &salt);
        sqlx::query(
            "UPDATE users SET name = $1, email = $2, password_salt = $3, password_hash = $4 WHERE id = $5",
        )
        .bind(name)
        .bind(email)
        .bind(&salt)
        .bind(&hash)
        .bind(user_id)
        .execute(pool)
        .await?
    } else {
        sqlx::query("UPDATE users SET name = $1, email = $2 WHERE id = $3")
            .bind(name)
            .bind(email)
            .bind(user_id)
            .execute(pool)
            .await?
    };

    if result.rows_affected() == 0 {
        return Err(AccountError::NotFound(user_id));
    }

    Ok(UserRow { id: user_id, name: name.to_string(), email: email.to_string() })
}

/// Delete an account. Posts, comments, likes, and messages cascade.
///
/// # Errors
///
/// Returns [`AccountError::NotFound`] when no such user exists.
pub async fn delete_user(pool: &PgPool, user_id: i64) -> Result<(), AccountError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AccountError::NotFound(user_id));
    }
    Ok(())
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
