//! Follow graph repository
//!
//! A row `(follower_id, followed_id)` means follower follows followed.
//! Every user follows themself; counts leave that edge out.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};

use super::users::USER_COLUMNS;
use super::{DbError, User};
use crate::models::{Paginated, Pagination};

/// One side of a follow edge plus when it was created
#[derive(Debug, Clone)]
pub struct FollowEntry {
    pub user: User,
    pub followed_at: DateTime<Utc>,
}

/// Which side of the relation a listing walks
#[derive(Debug, Clone, Copy)]
enum Direction {
    /// Users following the subject
    Followers,
    /// Users the subject follows
    Following,
}

/// Follow repository
pub struct FollowRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FollowRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Make `follower` follow `followed`. Returns false if already following.
    pub async fn follow(&self, follower: i64, followed: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followed_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(follower)
        .bind(followed)
        .execute(self.pool)
        .await?;

        let added = result.rows_affected() == 1;
        if added {
            tracing::debug!(follower, followed, "follow added");
        }
        Ok(added)
    }

    /// Remove the edge. Returns false if there was nothing to remove.
    pub async fn unfollow(&self, follower: i64, followed: i64) -> Result<bool, DbError> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
                .bind(follower)
                .bind(followed)
                .execute(self.pool)
                .await?;

        let removed = result.rows_affected() == 1;
        if removed {
            tracing::debug!(follower, followed, "follow removed");
        }
        Ok(removed)
    }

    /// Does `user` follow `other`?
    pub async fn is_following(&self, user: i64, other: i64) -> Result<bool, DbError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(user)
        .bind(other)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Does `other` follow `user`?
    pub async fn is_followed_by(&self, user: i64, other: i64) -> Result<bool, DbError> {
        self.is_following(other, user).await
    }

    /// Users following `user`, newest follow first
    pub async fn followers(
        &self,
        user: i64,
        page: Pagination,
    ) -> Result<Paginated<FollowEntry>, DbError> {
        self.list(user, Direction::Followers, page).await
    }

    /// Users `user` follows, newest follow first
    pub async fn following(
        &self,
        user: i64,
        page: Pagination,
    ) -> Result<Paginated<FollowEntry>, DbError> {
        self.list(user, Direction::Following, page).await
    }

    /// Followers, not counting the self-follow
    pub async fn followers_count(&self, user: i64) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE followed_id = $1 AND follower_id <> followed_id",
        )
        .bind(user)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Followed users, not counting the self-follow
    pub async fn following_count(&self, user: i64) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE follower_id = $1 AND follower_id <> followed_id",
        )
        .bind(user)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    async fn list(
        &self,
        user: i64,
        direction: Direction,
        page: Pagination,
    ) -> Result<Paginated<FollowEntry>, DbError> {
        // (column matching the subject, column joined to the listed user)
        let (subject, other) = match direction {
            Direction::Followers => ("followed_id", "follower_id"),
            Direction::Following => ("follower_id", "followed_id"),
        };

        let sql = format!(
            r#"
            SELECT {columns}, f.created_at AS followed_at, COUNT(*) OVER() AS total
            FROM follows f
            JOIN users u ON u.id = f.{other}
            LEFT JOIN roles r ON r.id = u.role_id
            WHERE f.{subject} = $1
            ORDER BY f.created_at DESC, u.id
            LIMIT $2 OFFSET $3
            "#,
            columns = USER_COLUMNS,
            other = other,
            subject = subject,
        );

        let rows = sqlx::query(&sql)
            .bind(user)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")?,
            None if page.page > 1 => {
                let count_sql = format!("SELECT COUNT(*) FROM follows WHERE {} = $1", subject);
                sqlx::query_scalar::<_, i64>(&count_sql)
                    .bind(user)
                    .fetch_one(self.pool)
                    .await?
            }
            None => 0,
        };

        let items = rows
            .iter()
            .map(|row| {
                Ok(FollowEntry {
                    user: User::from_row(row)?,
                    followed_at: row.try_get("followed_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Paginated::new(items, total, page))
    }
}
