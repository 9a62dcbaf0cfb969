//! Profiles by username, own-profile edits and the follow graph

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::repos::{FollowRepo, ProfileEdit, User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiViewer, CanFollow, ConfirmedUser};
use crate::http::json::{FollowJson, ProfileJson, ProfileStats};
use crate::models::{Paginated, PaginationParams, ProfileField};
use crate::state::AppState;

/// Own-profile edit form
#[derive(Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub username: String,
    pub following: bool,
    pub followers_count: i64,
}

async fn stats(
    state: &AppState,
    user: &User,
    viewer_id: Option<i64>,
) -> Result<ProfileStats, ApiError> {
    let follows = FollowRepo::new(&state.pool);

    let (following, follows_you) = match viewer_id {
        Some(viewer_id) => (
            follows.is_following(viewer_id, user.id).await?,
            follows.is_followed_by(viewer_id, user.id).await?,
        ),
        None => (false, false),
    };

    Ok(ProfileStats {
        post_count: UserRepo::new(&state.pool).post_count(user.id).await?,
        followers_count: follows.followers_count(user.id).await?,
        following_count: follows.following_count(user.id).await?,
        following,
        follows_you,
    })
}

/// GET /profiles/{username}
async fn get_profile(
    State(state): State<Arc<AppState>>,
    viewer: ApiViewer,
    Path(username): Path<String>,
) -> Result<Json<ProfileJson>, ApiError> {
    let user = UserRepo::new(&state.pool).by_username(&username).await?;
    let stats = stats(&state, &user, viewer.user_id()).await?;
    Ok(Json(ProfileJson::new(&state, &user, viewer.viewer(), stats)))
}

/// PUT /profile - edit the caller's own profile
async fn edit_profile(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<ProfileJson>, ApiError> {
    let edit = ProfileEdit {
        name: ProfileField::new("name", req.name.as_deref())?,
        location: ProfileField::new("location", req.location.as_deref())?,
        about_me: req.about_me.filter(|s| !s.trim().is_empty()),
    };

    let updated = UserRepo::new(&state.pool).update_profile(user.id, &edit).await?;
    tracing::info!(user_id = user.id, "profile updated");

    let stats = stats(&state, &updated, Some(user.id)).await?;
    Ok(Json(ProfileJson::new(&state, &updated, user.viewer(), stats)))
}

/// POST /profiles/{username}/follow
async fn follow(
    State(state): State<Arc<AppState>>,
    CanFollow(user): CanFollow,
    Path(username): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let target = UserRepo::new(&state.pool).by_username(&username).await?;
    let follows = FollowRepo::new(&state.pool);

    if !follows.follow(user.id, target.id).await? {
        return Err(ApiError::conflict("You are already following this user."));
    }

    Ok(Json(FollowResponse {
        followers_count: follows.followers_count(target.id).await?,
        username: target.username,
        following: true,
    }))
}

/// DELETE /profiles/{username}/follow
async fn unfollow(
    State(state): State<Arc<AppState>>,
    CanFollow(user): CanFollow,
    Path(username): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let target = UserRepo::new(&state.pool).by_username(&username).await?;
    let follows = FollowRepo::new(&state.pool);

    if !follows.unfollow(user.id, target.id).await? {
        return Err(ApiError::conflict("You are not following this user."));
    }

    Ok(Json(FollowResponse {
        followers_count: follows.followers_count(target.id).await?,
        username: target.username,
        following: false,
    }))
}

/// GET /profiles/{username}/followers
async fn followers(
    State(state): State<Arc<AppState>>,
    _viewer: ApiViewer,
    Path(username): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<FollowJson>>, ApiError> {
    let user = UserRepo::new(&state.pool).by_username(&username).await?;
    let page = params.with_per_page(state.pages().follows_per_page);
    let entries = FollowRepo::new(&state.pool).followers(user.id, page).await?;
    Ok(Json(entries.map(|e| FollowJson::new(&state, e))))
}

/// GET /profiles/{username}/following
async fn following(
    State(state): State<Arc<AppState>>,
    _viewer: ApiViewer,
    Path(username): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<FollowJson>>, ApiError> {
    let user = UserRepo::new(&state.pool).by_username(&username).await?;
    let page = params.with_per_page(state.pages().follows_per_page);
    let entries = FollowRepo::new(&state.pool).following(user.id, page).await?;
    Ok(Json(entries.map(|e| FollowJson::new(&state, e))))
}

/// Profile routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", put(edit_profile))
        .route("/profiles/{username}", get(get_profile))
        .route("/profiles/{username}/follow", post(follow).delete(unfollow))
        .route("/profiles/{username}/followers", get(followers))
        .route("/profiles/{username}/following", get(following))
}
