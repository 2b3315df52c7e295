//! Account routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::services::account::{self, AccountError, UserRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateUserBody {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateUserBody {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
}

/// `POST /api/users` — register an account.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserBody>,
) -> Result<(StatusCode, Json<UserRow>), StatusCode> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user = account::create_user(&state.pool, body.name.trim(), body.email.trim(), &body.password)
        .await
        .map_err(account_error_to_status)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /api/login` — verify credentials, return the account.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<UserRow>, StatusCode> {
    let user = account::verify_login(&state.pool, body.email.trim(), &body.password)
        .await
        .map_err(account_error_to_status)?;
    Ok(Json(user))
}

/// `GET /api/users` — list accounts.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserRow>>, StatusCode> {
    let users = account::list_users(&state.pool)
        .await
        .map_err(account_error_to_status)?;
    Ok(Json(users))
}

/// `PATCH /api/users/:id` — update name, email, optionally password.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<UserRow>, StatusCode> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user = account::update_user(
        &state.pool,
        user_id,
        body.name.trim(),
        body.email.trim(),
        body.password.as_deref(),
    )
    .await
    .map_err(account_error_to_status)?;

    Ok(Json(user))
}

/// `DELETE /api/users/:id` — delete an account.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    account::delete_user(&state.pool, user_id)
        .await
        .map_err(account_error_to_status)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub(crate) fn account_error_to_status(err: AccountError) -> StatusCode {
    match err {
        AccountError::NotFound(_) => StatusCode::NOT_FOUND,
        AccountError::EmailTaken => StatusCode::CONFLICT,
        AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
