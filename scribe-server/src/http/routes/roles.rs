//! Role listing for administrators

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::repos::RoleRepo;
use crate::http::error::ApiError;
use crate::http::extractors::Admin;
use crate::http::json::RoleJson;
use crate::state::AppState;

/// GET /roles
async fn list_roles(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
) -> Result<Json<Vec<RoleJson>>, ApiError> {
    let roles = RoleRepo::new(&state.pool).list().await?;
    Ok(Json(roles.into_iter().map(RoleJson::from).collect()))
}

/// Role routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/roles", get(list_roles))
}
