//! Comment repository
//!
//! Comments under a post read oldest first; the moderation queue reads
//! newest first across all posts.

use chrono::{DateTime, Utc};
use scribe_core::render_comment;
use sqlx::{FromRow, PgPool, Row};

use super::DbError;
use crate::models::{Body, CommentPageParams, Paginated, Pagination};

const COMMENT_COLUMNS: &str = r#"
    c.id, c.body, c.body_html, c.created_at, c.disabled,
    c.author_id, a.username AS author_username, c.post_id
"#;

/// Comment with its author's name
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub body_html: String,
    pub created_at: DateTime<Utc>,
    pub disabled: bool,
    pub author_id: i64,
    pub author_username: String,
    pub post_id: i64,
}

/// Comment repository
pub struct CommentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        body: &Body,
    ) -> Result<Comment, DbError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO comments (body, body_html, author_id, post_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(body.as_str())
        .bind(render_comment(body.as_str()))
        .bind(author_id)
        .bind(post_id)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(comment_id = id, post_id, author_id, "comment created");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Comment, DbError> {
        let sql = format!(
            "SELECT {} FROM comments c JOIN users a ON a.id = c.author_id WHERE c.id = $1",
            COMMENT_COLUMNS
        );
        sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("comment", id))
    }

    pub async fn count_for_post(&self, post_id: i64) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Comments on a post, oldest first.
    ///
    /// The total is needed up front to resolve `page=-1` to the last page,
    /// so this counts before fetching.
    pub async fn for_post(
        &self,
        post_id: i64,
        params: CommentPageParams,
        per_page: u32,
    ) -> Result<Paginated<Comment>, DbError> {
        let total = self.count_for_post(post_id).await?;
        let page = params.resolve(total, per_page);
        if total == 0 {
            return Ok(Paginated::empty(page));
        }

        let sql = format!(
            r#"
            SELECT {}
            FROM comments c
            JOIN users a ON a.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            LIMIT $2 OFFSET $3
            "#,
            COMMENT_COLUMNS
        );
        let items = sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Paginated::new(items, total, page))
    }

    /// Every comment, newest first
    pub async fn list_all(&self, page: Pagination) -> Result<Paginated<Comment>, DbError> {
        let sql = format!(
            r#"
            SELECT {}, COUNT(*) OVER() AS total
            FROM comments c
            JOIN users a ON a.id = c.author_id
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $1 OFFSET $2
            "#,
            COMMENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None if page.page > 1 => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
                    .fetch_one(self.pool)
                    .await?
            }
            None => 0,
        };

        let items = rows
            .iter()
            .map(Comment::from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Paginated::new(items, total, page))
    }

    /// Hide or show a comment.
    pub async fn set_disabled(&self, id: i64, disabled: bool) -> Result<Comment, DbError> {
        let result = sqlx::query("UPDATE comments SET disabled = $2 WHERE id = $1")
            .bind(id)
            .bind(disabled)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("comment", id));
        }
        tracing::info!(comment_id = id, disabled, "comment moderated");
        self.get(id).await
    }
}
