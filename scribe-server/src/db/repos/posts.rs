//! Post repository
//!
//! `body_html` is rendered here on every write so stored HTML never drifts
//! from the markdown source.

use chrono::{DateTime, Utc};
use scribe_core::render_post;
use sqlx::{FromRow, PgPool, Row};

use super::DbError;
use crate::models::{Body, Paginated, Pagination};

const POST_COLUMNS: &str = r#"
    p.id, p.body, p.body_html, p.created_at, p.author_id,
    a.username AS author_username,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
"#;

/// Post with author name and comment count
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub body: String,
    pub body_html: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub comment_count: i64,
}

/// Which posts a listing covers
#[derive(Debug, Clone, Copy)]
enum Scope {
    All,
    Author(i64),
    /// Posts by anyone the user follows
    FollowedBy(i64),
}

impl Scope {
    /// (extra join, where clause); `$1` is the scope id when there is one
    fn sql(&self) -> (&'static str, &'static str) {
        match self {
            Self::All => ("", "TRUE"),
            Self::Author(_) => ("", "p.author_id = $1"),
            Self::FollowedBy(_) => (
                "JOIN follows f ON f.followed_id = p.author_id",
                "f.follower_id = $1",
            ),
        }
    }

    fn id(&self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Author(id) | Self::FollowedBy(id) => Some(*id),
        }
    }
}

/// Post repository
pub struct PostRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, author_id: i64, body: &Body) -> Result<Post, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (body, body_html, author_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(body.as_str())
        .bind(render_post(body.as_str()))
        .bind(author_id)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(post_id = id, author_id, "post created");
        self.get(id).await
    }

    /// Replace the body, re-rendering its HTML.
    pub async fn update_body(&self, id: i64, body: &Body) -> Result<Post, DbError> {
        let result = sqlx::query("UPDATE posts SET body = $2, body_html = $3 WHERE id = $1")
            .bind(id)
            .bind(body.as_str())
            .bind(render_post(body.as_str()))
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("post", id));
        }
        tracing::info!(post_id = id, "post updated");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Post, DbError> {
        let sql = format!(
            "SELECT {} FROM posts p JOIN users a ON a.id = p.author_id WHERE p.id = $1",
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("post", id))
    }

    /// Every post, newest first
    pub async fn list(&self, page: Pagination) -> Result<Paginated<Post>, DbError> {
        self.page(Scope::All, page).await
    }

    /// Posts written by `author_id`, newest first
    pub async fn by_author(
        &self,
        author_id: i64,
        page: Pagination,
    ) -> Result<Paginated<Post>, DbError> {
        self.page(Scope::Author(author_id), page).await
    }

    /// Posts by users `user_id` follows, including their own, newest first
    pub async fn followed_by(
        &self,
        user_id: i64,
        page: Pagination,
    ) -> Result<Paginated<Post>, DbError> {
        self.page(Scope::FollowedBy(user_id), page).await
    }

    async fn page(&self, scope: Scope, page: Pagination) -> Result<Paginated<Post>, DbError> {
        let (join, filter) = scope.sql();
        let (limit_at, offset_at) = if scope.id().is_some() { (2, 3) } else { (1, 2) };

        let sql = format!(
            r#"
            SELECT {columns}, COUNT(*) OVER() AS total
            FROM posts p
            JOIN users a ON a.id = p.author_id
            {join}
            WHERE {filter}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ${limit_at} OFFSET ${offset_at}
            "#,
            columns = POST_COLUMNS,
        );

        let mut query = sqlx::query(&sql);
        if let Some(id) = scope.id() {
            query = query.bind(id);
        }
        let rows = query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None if page.page > 1 => self.count(scope).await?,
            None => 0,
        };

        let items = rows
            .iter()
            .map(Post::from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Paginated::new(items, total, page))
    }

    async fn count(&self, scope: Scope) -> Result<i64, DbError> {
        let (join, filter) = scope.sql();
        let sql = format!("SELECT COUNT(*) FROM posts p {join} WHERE {filter}");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(id) = scope.id() {
            query = query.bind(id);
        }
        Ok(query.fetch_one(self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{test_support, FollowRepo};

    fn body(text: &str) -> Body {
        Body::post(Some(text)).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_renders_html() {
        let pool = test_support::pool().await;
        let author = test_support::user(&pool, "cat").await;
        let repo = PostRepo::new(&pool);

        let post = repo.create(author.id, &body("*hello*")).await.unwrap();
        assert_eq!(post.body, "*hello*");
        assert!(post.body_html.contains("<em>hello</em>"));
        assert_eq!(post.author_username, author.username);
        assert_eq!(post.comment_count, 0);

        let updated = repo.update_body(post.id, &body("**bye**")).await.unwrap();
        assert!(updated.body_html.contains("<strong>bye</strong>"));
        assert!(!updated.body_html.contains("<em>"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn feed_holds_followed_and_own_posts() {
        let pool = test_support::pool().await;
        let a = test_support::user(&pool, "cat").await;
        let b = test_support::user(&pool, "dog").await;
        let c = test_support::user(&pool, "cow").await;
        let repo = PostRepo::new(&pool);

        let own = repo.create(a.id, &body("mine")).await.unwrap();
        let followed = repo.create(b.id, &body("theirs")).await.unwrap();
        let stranger = repo.create(c.id, &body("stranger")).await.unwrap();
        FollowRepo::new(&pool).follow(a.id, b.id).await.unwrap();

        let feed = repo.followed_by(a.id, Pagination::new(1, 50)).await.unwrap();
        let ids: Vec<i64> = feed.items.iter().map(|p| p.id).collect();
        assert_eq!(feed.total, 2);
        assert_eq!(ids, vec![followed.id, own.id]);
        assert!(!ids.contains(&stranger.id));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn by_author_pages() {
        let pool = test_support::pool().await;
        let a = test_support::user(&pool, "cat").await;
        let repo = PostRepo::new(&pool);
        for n in 0..3 {
            repo.create(a.id, &body(&format!("post {}", n))).await.unwrap();
        }

        let first = repo.by_author(a.id, Pagination::new(1, 2)).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total, 3);
        assert!(first.has_next());

        let past_end = repo.by_author(a.id, Pagination::new(9, 2)).await.unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 3);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn missing_post_is_not_found() {
        let pool = test_support::pool().await;
        let err = PostRepo::new(&pool).get(-1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "post", .. }));
    }
}
