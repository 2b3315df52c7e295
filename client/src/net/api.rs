//! REST calls: account registration, login, and the history query.

use serde::Deserialize;

use crate::net::types::HistoryMessage;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
}

/// Account row as returned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
}

async fn expect_ok(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if !resp.status().is_success() {
        return Err(ApiError::Status(resp.status()));
    }
    Ok(resp)
}

/// `POST /api/users` — create an account.
///
/// # Errors
///
/// Returns an error on transport failure or a non-2xx response.
pub async fn create_account(
    base_url: &str,
    name: &str,
    email: &str,
    password: &str,
) -> Result<UserProfile, ApiError> {
    let resp = reqwest::Client::new()
        .post(format!("{base_url}/api/users"))
        .json(&serde_json::json!({ "name": name, "email": email, "password": password }))
        .send()
        .await?;
    Ok(expect_ok(resp).await?.json().await?)
}

/// `POST /api/login` — verify credentials; the returned profile supplies
/// the user id and display name used to register on the socket.
///
/// # Errors
///
/// Returns an error on transport failure or a non-2xx response.
pub async fn login(base_url: &str, email: &str, password: &str) -> Result<UserProfile, ApiError> {
    let resp = reqwest::Client::new()
        .post(format!("{base_url}/api/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await?;
    Ok(expect_ok(resp).await?.json().await?)
}

/// `GET /api/chat/history/:a/:b` — the persisted conversation with a partner.
///
/// # Errors
///
/// Returns an error on transport failure or a non-2xx response.
pub async fn fetch_history(
    base_url: &str,
    self_id: i64,
    partner_id: i64,
) -> Result<Vec<HistoryMessage>, ApiError> {
    let resp = reqwest::Client::new()
        .get(format!("{base_url}/api/chat/history/{self_id}/{partner_id}"))
        .send()
        .await?;
    Ok(expect_ok(resp).await?.json().await?)
}
