//! Route handlers organized by resource
//!
//! `/health` and `/auth/*` sit at the root; everything else lives under
//! `/api/v1`, where authenticated callers must have confirmed their account.

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod comments;
pub mod health;
pub mod moderation;
pub mod posts;
pub mod profiles;
pub mod roles;
pub mod tokens;
pub mod users;

/// Routes mounted under `/api/v1`
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(tokens::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(moderation::router())
        .merge(users::router())
        .merge(profiles::router())
        .merge(roles::router())
}

/// Every route
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .nest("/api/v1", api_router())
}
