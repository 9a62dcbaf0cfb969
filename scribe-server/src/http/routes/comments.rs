//! Single-comment lookup

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::repos::CommentRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{ApiViewer, IdPath};
use crate::http::json::CommentJson;
use crate::state::AppState;

/// GET /comments/{id}
async fn get_comment(
    State(state): State<Arc<AppState>>,
    viewer: ApiViewer,
    IdPath(id): IdPath,
) -> Result<Json<CommentJson>, ApiError> {
    let comment = CommentRepo::new(&state.pool).get(id).await?;
    Ok(Json(CommentJson::new(&state, comment, viewer.viewer())))
}

/// Comment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/comments/{id}", get(get_comment))
}
