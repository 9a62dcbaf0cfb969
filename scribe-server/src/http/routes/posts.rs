//! Post endpoints, including a post's comments

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{CommentRepo, PostRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ApiViewer, CanComment, CanWrite, ConfirmedUser, IdPath};
use crate::http::json::{CommentJson, PostJson};
use crate::models::{Body, CommentPageParams, Paginated, PaginationParams};
use crate::state::AppState;

/// Post or comment body
#[derive(Deserialize)]
pub struct BodyRequest {
    pub body: Option<String>,
}

/// GET /posts - every post, newest first
async fn list_posts(
    State(state): State<Arc<AppState>>,
    _viewer: ApiViewer,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<PostJson>>, ApiError> {
    let page = params.with_per_page(state.pages().posts_per_page);
    let posts = PostRepo::new(&state.pool).list(page).await?;
    Ok(Json(posts.map(|p| PostJson::new(&state, p))))
}

/// GET /posts/feed - posts by users the caller follows
async fn feed(
    State(state): State<Arc<AppState>>,
    ConfirmedUser(user): ConfirmedUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<PostJson>>, ApiError> {
    let page = params.with_per_page(state.pages().posts_per_page);
    let posts = PostRepo::new(&state.pool).followed_by(user.id, page).await?;
    Ok(Json(posts.map(|p| PostJson::new(&state, p))))
}

/// POST /posts
async fn create_post(
    State(state): State<Arc<AppState>>,
    CanWrite(user): CanWrite,
    Json(req): Json<BodyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = Body::post(req.body.as_deref())?;
    let post = PostRepo::new(&state.pool).create(user.id, &body).await?;
    let json = PostJson::new(&state, post);

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(LOCATION, json.url.clone())]),
        Json(json),
    ))
}

/// GET /posts/{id}
async fn get_post(
    State(state): State<Arc<AppState>>,
    _viewer: ApiViewer,
    IdPath(id): IdPath,
) -> Result<Json<PostJson>, ApiError> {
    let post = PostRepo::new(&state.pool).get(id).await?;
    Ok(Json(PostJson::new(&state, post)))
}

/// PUT /posts/{id} - author or administrator only
async fn edit_post(
    State(state): State<Arc<AppState>>,
    CanWrite(user): CanWrite,
    IdPath(id): IdPath,
    Json(req): Json<BodyRequest>,
) -> Result<Json<PostJson>, ApiError> {
    let repo = PostRepo::new(&state.pool);
    let post = repo.get(id).await?;
    if post.author_id != user.id && !user.is_administrator() {
        return Err(ApiError::insufficient_permissions());
    }

    let body = Body::post(req.body.as_deref())?;
    let post = repo.update_body(id, &body).await?;
    Ok(Json(PostJson::new(&state, post)))
}

/// GET /posts/{id}/comments - oldest first, `page=-1` for the last page
async fn list_comments(
    State(state): State<Arc<AppState>>,
    viewer: ApiViewer,
    IdPath(id): IdPath,
    Query(params): Query<CommentPageParams>,
) -> Result<Json<Paginated<CommentJson>>, ApiError> {
    let post = PostRepo::new(&state.pool).get(id).await?;
    let comments = CommentRepo::new(&state.pool)
        .for_post(post.id, params, state.pages().comments_per_page)
        .await?;

    let viewer = viewer.viewer();
    Ok(Json(comments.map(|c| CommentJson::new(&state, c, viewer))))
}

/// POST /posts/{id}/comments
async fn create_comment(
    State(state): State<Arc<AppState>>,
    CanComment(user): CanComment,
    IdPath(id): IdPath,
    Json(req): Json<BodyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = Body::comment(req.body.as_deref())?;
    let post = PostRepo::new(&state.pool).get(id).await?;
    let comment = CommentRepo::new(&state.pool)
        .create(post.id, user.id, &body)
        .await?;
    let json = CommentJson::new(&state, comment, user.viewer());

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(LOCATION, json.url.clone())]),
        Json(json),
    ))
}

/// Post routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/feed", get(feed))
        .route("/posts/{id}", get(get_post).put(edit_post))
        .route("/posts/{id}/comments", get(list_comments).post(create_comment))
}
