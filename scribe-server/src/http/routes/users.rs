//! User endpoints addressed by id

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{AdminEdit, DbError, PostRepo, ProfileEdit, RoleRepo, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{Admin, ApiViewer, IdPath};
use crate::http::json::{PostJson, UserJson};
use crate::models::{Email, Paginated, PaginationParams, ProfileField, Username, ValidationError};
use crate::state::AppState;

/// Administrator edit form
#[derive(Deserialize)]
pub struct AdminEditRequest {
    pub email: String,
    pub username: String,
    pub confirmed: bool,
    pub role_id: i64,
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
}

/// GET /users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    _viewer: ApiViewer,
    IdPath(id): IdPath,
) -> Result<Json<UserJson>, ApiError> {
    let repo = UserRepo::new(&state.pool);
    let user = repo.get(id).await?;
    let post_count = repo.post_count(user.id).await?;
    Ok(Json(UserJson::new(&state, &user, post_count)))
}

/// GET /users/{id}/posts
async fn user_posts(
    State(state): State<Arc<AppState>>,
    _viewer: ApiViewer,
    IdPath(id): IdPath,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<PostJson>>, ApiError> {
    let user = UserRepo::new(&state.pool).get(id).await?;
    let page = params.with_per_page(state.pages().posts_per_page);
    let posts = PostRepo::new(&state.pool).by_author(user.id, page).await?;
    Ok(Json(posts.map(|p| PostJson::new(&state, p))))
}

/// GET /users/{id}/timeline - posts by everyone the user follows
async fn user_timeline(
    State(state): State<Arc<AppState>>,
    _viewer: ApiViewer,
    IdPath(id): IdPath,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<PostJson>>, ApiError> {
    let user = UserRepo::new(&state.pool).get(id).await?;
    let page = params.with_per_page(state.pages().posts_per_page);
    let posts = PostRepo::new(&state.pool).followed_by(user.id, page).await?;
    Ok(Json(posts.map(|p| PostJson::new(&state, p))))
}

/// PUT /users/{id} - administrator edit of any account
async fn admin_edit(
    State(state): State<Arc<AppState>>,
    Admin(admin): Admin,
    IdPath(id): IdPath,
    Json(req): Json<AdminEditRequest>,
) -> Result<Json<UserJson>, ApiError> {
    let edit = AdminEdit {
        email: Email::new(&req.email)?,
        username: Username::new(&req.username)?,
        confirmed: req.confirmed,
        role_id: req.role_id,
        profile: ProfileEdit {
            name: ProfileField::new("name", req.name.as_deref())?,
            location: ProfileField::new("location", req.location.as_deref())?,
            about_me: req.about_me,
        },
    };

    match RoleRepo::new(&state.pool).get(edit.role_id).await {
        Ok(_) => {}
        Err(DbError::NotFound { .. }) => {
            return Err(ValidationError::InvalidFormat {
                field: "role_id",
                reason: "no such role",
            }
            .into())
        }
        Err(e) => return Err(e.into()),
    }

    let repo = UserRepo::new(&state.pool);
    let user = repo.admin_update(id, &edit).await?;
    tracing::info!(admin_id = admin.id, user_id = id, "profile updated by administrator");

    let post_count = repo.post_count(user.id).await?;
    Ok(Json(UserJson::new(&state, &user, post_count)))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{id}", get(get_user).put(admin_edit))
        .route("/users/{id}/posts", get(user_posts))
        .route("/users/{id}/timeline", get(user_timeline))
}
