//! Auth token issuance

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use chrono::Duration;
use scribe_core::AUTH_TTL_SECS;
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::{require_confirmed, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expiration: i64,
}

/// POST /api/v1/tokens
///
/// Only a password may mint a token; a token can't renew itself.
async fn issue_token(
    State(state): State<Arc<AppState>>,
    AuthUser { user, token_used }: AuthUser,
) -> Result<Json<TokenResponse>, ApiError> {
    if token_used {
        return Err(ApiError::invalid_credentials());
    }
    require_confirmed(&user)?;

    let token = state
        .tokens
        .issue_auth(user.id, Duration::seconds(AUTH_TTL_SECS))?;

    Ok(Json(TokenResponse {
        token,
        expiration: AUTH_TTL_SECS,
    }))
}

/// Token routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tokens", post(issue_token))
}
