//! Comment moderation
//!
//! Moderators see every comment, disabled ones included, and can hide or
//! restore them. Nothing is ever deleted.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::db::repos::{Comment, CommentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CanModerate, IdPath};
use crate::http::json::CommentJson;
use crate::models::{Paginated, PaginationParams};
use crate::state::AppState;

/// GET /moderate - every comment, newest first
async fn queue(
    State(state): State<Arc<AppState>>,
    CanModerate(user): CanModerate,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<CommentJson>>, ApiError> {
    let page = params.with_per_page(state.pages().comments_per_page);
    let comments = CommentRepo::new(&state.pool).list_all(page).await?;

    let viewer = user.viewer();
    Ok(Json(comments.map(|c| CommentJson::new(&state, c, viewer))))
}

async fn set_disabled(
    state: &AppState,
    moderator_id: i64,
    id: i64,
    disabled: bool,
) -> Result<Comment, ApiError> {
    let comment = CommentRepo::new(&state.pool).set_disabled(id, disabled).await?;
    tracing::info!(moderator_id, comment_id = id, disabled, "moderation action");
    Ok(comment)
}

/// POST /moderate/comments/{id}/enable
async fn enable(
    State(state): State<Arc<AppState>>,
    CanModerate(user): CanModerate,
    IdPath(id): IdPath,
) -> Result<Json<CommentJson>, ApiError> {
    let comment = set_disabled(&state, user.id, id, false).await?;
    Ok(Json(CommentJson::new(&state, comment, user.viewer())))
}

/// POST /moderate/comments/{id}/disable
async fn disable(
    State(state): State<Arc<AppState>>,
    CanModerate(user): CanModerate,
    IdPath(id): IdPath,
) -> Result<Json<CommentJson>, ApiError> {
    let comment = set_disabled(&state, user.id, id, true).await?;
    Ok(Json(CommentJson::new(&state, comment, user.viewer())))
}

/// Moderation routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/moderate", get(queue))
        .route("/moderate/comments/{id}/enable", post(enable))
        .route("/moderate/comments/{id}/disable", post(disable))
}
