//! JSON representations of domain records
//!
//! Every resource carries absolute URLs to itself and its neighbours so
//! clients can walk the API without building paths.

use chrono::{DateTime, Utc};
use scribe_core::{Permission, Viewer};
use serde::Serialize;

use crate::db::repos::{Comment, FollowEntry, Post, Role, User};
use crate::models::gravatar_url;
use crate::state::AppState;

const AVATAR_SIZE: u32 = 100;

pub fn user_url(state: &AppState, id: i64) -> String {
    state.url(&format!("/api/v1/users/{}", id))
}

pub fn post_url(state: &AppState, id: i64) -> String {
    state.url(&format!("/api/v1/posts/{}", id))
}

pub fn comment_url(state: &AppState, id: i64) -> String {
    state.url(&format!("/api/v1/comments/{}", id))
}

fn avatar_url(state: &AppState, user: &User) -> String {
    let secure = state.base_url.starts_with("https://");
    gravatar_url(&user.avatar_hash(), AVATAR_SIZE, secure)
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserJson {
    pub id: i64,
    pub url: String,
    pub username: String,
    pub member_since: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub posts_url: String,
    pub followed_posts_url: String,
    pub post_count: i64,
    pub avatar_url: String,
}

impl UserJson {
    pub fn new(state: &AppState, user: &User, post_count: i64) -> Self {
        let url = user_url(state, user.id);
        Self {
            id: user.id,
            posts_url: format!("{}/posts", url),
            followed_posts_url: format!("{}/timeline", url),
            url,
            username: user.username.clone(),
            member_since: user.member_since,
            last_seen: user.last_seen,
            post_count,
            avatar_url: avatar_url(state, user),
        }
    }
}

/// The caller's own account
#[derive(Debug, Serialize)]
pub struct MeJson {
    #[serde(flatten)]
    pub user: UserJson,
    pub email: String,
    pub confirmed: bool,
    pub role: Option<String>,
    pub permissions: Vec<&'static str>,
}

impl MeJson {
    pub fn new(state: &AppState, user: &User, post_count: i64) -> Self {
        Self {
            user: UserJson::new(state, user, post_count),
            email: user.email.clone(),
            confirmed: user.confirmed,
            role: user.role_name.clone(),
            permissions: user
                .permission_set()
                .map(|p| p.names())
                .unwrap_or_default(),
        }
    }
}

/// Profile page data, relative to whoever is looking
#[derive(Debug, Serialize)]
pub struct ProfileJson {
    #[serde(flatten)]
    pub user: UserJson,
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
    /// Shown to administrators only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    /// The viewer follows this user
    pub following: bool,
    /// This user follows the viewer
    pub follows_you: bool,
}

/// Counts and follow state for a profile
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileStats {
    pub post_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
    pub following: bool,
    pub follows_you: bool,
}

impl ProfileJson {
    pub fn new(state: &AppState, user: &User, viewer: Viewer, stats: ProfileStats) -> Self {
        Self {
            user: UserJson::new(state, user, stats.post_count),
            name: user.name.clone(),
            location: user.location.clone(),
            about_me: user.about_me.clone(),
            email: viewer.is_administrator().then(|| user.email.clone()),
            followers_count: stats.followers_count,
            following_count: stats.following_count,
            following: stats.following,
            follows_you: stats.follows_you,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostJson {
    pub id: i64,
    pub url: String,
    pub body: String,
    pub body_html: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub author_url: String,
    pub comments_url: String,
    pub comment_count: i64,
}

impl PostJson {
    pub fn new(state: &AppState, post: Post) -> Self {
        let url = post_url(state, post.id);
        Self {
            id: post.id,
            comments_url: format!("{}/comments", url),
            url,
            body: post.body,
            body_html: post.body_html,
            timestamp: post.created_at,
            author: post.author_username,
            author_url: user_url(state, post.author_id),
            comment_count: post.comment_count,
        }
    }
}

/// A comment; a disabled comment's text is withheld unless the viewer
/// can moderate
#[derive(Debug, Serialize)]
pub struct CommentJson {
    pub id: i64,
    pub url: String,
    pub post_url: String,
    pub body: Option<String>,
    pub body_html: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub author_url: String,
    pub disabled: bool,
}

impl CommentJson {
    pub fn new(state: &AppState, comment: Comment, viewer: Viewer) -> Self {
        let visible = !comment.disabled || viewer.can(Permission::MODERATE);
        Self {
            id: comment.id,
            url: comment_url(state, comment.id),
            post_url: post_url(state, comment.post_id),
            body: visible.then_some(comment.body),
            body_html: visible.then_some(comment.body_html),
            timestamp: comment.created_at,
            author: comment.author_username,
            author_url: user_url(state, comment.author_id),
            disabled: comment.disabled,
        }
    }
}

/// One entry of a followers/following list
#[derive(Debug, Serialize)]
pub struct FollowJson {
    pub username: String,
    pub url: String,
    pub avatar_url: String,
    pub timestamp: DateTime<Utc>,
}

impl FollowJson {
    pub fn new(state: &AppState, entry: FollowEntry) -> Self {
        Self {
            url: user_url(state, entry.user.id),
            avatar_url: avatar_url(state, &entry.user),
            username: entry.user.username,
            timestamp: entry.followed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleJson {
    pub id: i64,
    pub name: String,
    pub default: bool,
    pub permissions: i32,
    pub permission_names: Vec<&'static str>,
}

impl From<Role> for RoleJson {
    fn from(role: Role) -> Self {
        Self {
            permission_names: role.permission_set().names(),
            id: role.id,
            name: role.name,
            default: role.is_default,
            permissions: role.permissions,
        }
    }
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageJson {
    pub message: &'static str,
}
