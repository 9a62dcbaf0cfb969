//! Account endpoints: registration, confirmation and the current user

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Duration;
use scribe_core::{PasswordHash, CONFIRMATION_TTL_SECS};
use serde::{Deserialize, Serialize};

use crate::db::repos::{NewUser, User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::json::{MeJson, MessageJson};
use crate::mail::{confirmation_email, send_email};
use crate::models::{Email, NewPassword, Username};
use crate::state::AppState;

/// Registration form
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password2: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: MeJson,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub confirmed: bool,
    pub message: &'static str,
}

/// Issue a confirmation token for `user` and mail it off.
fn send_confirmation(state: &AppState, user: &User) -> Result<(), ApiError> {
    let token = state
        .tokens
        .issue_confirmation(user.id, Duration::seconds(CONFIRMATION_TTL_SECS))?;
    let email = confirmation_email(
        &state.config.mail,
        &state.base_url,
        &user.email,
        &user.username,
        &token,
    );
    send_email(state.mailer.clone(), email);
    Ok(())
}

/// POST /auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = Email::new(&req.email)?;
    let username = Username::new(&req.username)?;
    let password = NewPassword::new(&req.password, &req.password2)?;

    // Argon2 hashing runs on the blocking pool
    let password_hash =
        tokio::task::spawn_blocking(move || PasswordHash::generate(password.password()))
            .await
            .map_err(|e| ApiError::Internal {
                message: format!("password hashing task failed: {}", e),
            })??;

    let is_admin = state.config.is_admin_email(email.as_str());
    let user = UserRepo::new(&state.pool)
        .create(
            NewUser {
                email,
                username,
                password_hash,
            },
            is_admin,
        )
        .await?;

    send_confirmation(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: MeJson::new(&state, &user, 0),
            message: "A confirmation email has been sent to you by email.",
        }),
    ))
}

/// GET /auth/confirm/{token}
async fn confirm(
    State(state): State<Arc<AppState>>,
    AuthUser { user, .. }: AuthUser,
    Path(token): Path<String>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    if user.confirmed {
        return Ok(Json(ConfirmResponse {
            confirmed: true,
            message: "Your account is already confirmed.",
        }));
    }

    let confirmed = UserRepo::new(&state.pool)
        .confirm(&user, &token, &state.tokens)
        .await?;
    if !confirmed {
        return Err(ApiError::bad_request(
            "The confirmation link is invalid or has expired.",
        ));
    }

    Ok(Json(ConfirmResponse {
        confirmed: true,
        message: "You have confirmed your account. Thanks!",
    }))
}

/// POST /auth/confirm - send a fresh confirmation email
async fn resend_confirmation(
    State(state): State<Arc<AppState>>,
    AuthUser { user, .. }: AuthUser,
) -> Result<(StatusCode, Json<MessageJson>), ApiError> {
    if user.confirmed {
        return Err(ApiError::conflict("Your account is already confirmed."));
    }

    send_confirmation(&state, &user)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageJson {
            message: "A new confirmation email has been sent to you by email.",
        }),
    ))
}

/// GET /auth/me
async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser { user, .. }: AuthUser,
) -> Result<Json<MeJson>, ApiError> {
    let post_count = UserRepo::new(&state.pool).post_count(user.id).await?;
    Ok(Json(MeJson::new(&state, &user, post_count)))
}

/// Account routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/confirm", post(resend_confirmation))
        .route("/auth/confirm/{token}", get(confirm))
        .route("/auth/me", get(me))
}
