//! User repository
//!
//! Patterns:
//! - create: role lookup + insert + self-follow in one transaction
//! - duplicate email/username surfaces as `DbError::Conflict` from the
//!   unique constraints, never from a pre-check alone
//! - every read joins the role so callers get permissions in one query

use chrono::{DateTime, Utc};
use scribe_core::{Password, PasswordHash, Permission, RoleName, TokenCodec, Viewer};
use sqlx::{FromRow, PgPool};

use super::DbError;
use crate::models::{avatar_hash, Email, ProfileField, Username};

/// Columns of `User`; expects `users u LEFT JOIN roles r`
pub(super) const USER_COLUMNS: &str = r#"
    u.id, u.email, u.username, u.password_hash, u.confirmed, u.role_id,
    r.name AS role_name, r.permissions,
    u.avatar_hash, u.name, u.location, u.about_me,
    u.member_since, u.last_seen
"#;

/// User record joined with its role
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub confirmed: bool,
    pub role_id: Option<i64>,
    pub role_name: Option<String>,
    pub permissions: Option<i32>,
    pub avatar_hash: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
    pub member_since: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl User {
    pub fn permission_set(&self) -> Option<Permission> {
        self.permissions.map(Permission::from_stored)
    }

    pub fn viewer(&self) -> Viewer {
        Viewer::User {
            id: self.id,
            permissions: self.permission_set(),
        }
    }

    pub fn can(&self, perm: Permission) -> bool {
        self.viewer().can(perm)
    }

    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMIN)
    }

    pub fn verify_password(&self, password: &Password) -> bool {
        PasswordHash::from_stored(self.password_hash.as_str()).verify(password)
    }

    /// Cached hash, or computed from the email for rows that predate it
    pub fn avatar_hash(&self) -> String {
        self.avatar_hash
            .clone()
            .unwrap_or_else(|| avatar_hash(&self.email))
    }
}

/// Validated registration input
#[derive(Debug)]
pub struct NewUser {
    pub email: Email,
    pub username: Username,
    pub password_hash: PasswordHash,
}

/// Fields a user may change on their own profile
#[derive(Debug, Default)]
pub struct ProfileEdit {
    pub name: ProfileField,
    pub location: ProfileField,
    pub about_me: Option<String>,
}

/// Fields an administrator may change on any account
#[derive(Debug)]
pub struct AdminEdit {
    pub email: Email,
    pub username: Username,
    pub confirmed: bool,
    pub role_id: i64,
    pub profile: ProfileEdit,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a user.
    ///
    /// `is_admin` selects the Administrator role; everyone else gets the
    /// default role. The new user follows themself so their own posts show
    /// up in their feed.
    pub async fn create(&self, new: NewUser, is_admin: bool) -> Result<User, DbError> {
        let mut tx = self.pool.begin().await?;

        let role_id: Option<i64> = if is_admin {
            sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
                .bind(RoleName::Administrator.as_str())
                .fetch_optional(&mut *tx)
                .await?
        } else {
            sqlx::query_scalar("SELECT id FROM roles WHERE is_default ORDER BY id LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?
        };
        if role_id.is_none() {
            tracing::warn!("no role found for new user; run `scribe roles insert`");
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, username, password_hash, role_id, avatar_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(new.email.as_str())
        .bind(new.username.as_str())
        .bind(new.password_hash.as_str())
        .bind(role_id)
        .bind(avatar_hash(new.email.as_str()))
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from_write)?;

        sqlx::query(
            "INSERT INTO follows (follower_id, followed_id) VALUES ($1, $1) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id = id, username = new.username.as_str(), "user registered");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<User, DbError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let sql = format!(
            "SELECT {} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE u.id = $1",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Case-insensitive email lookup
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let sql = format!(
            "SELECT {} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE LOWER(u.email) = LOWER($1)",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    pub async fn by_username(&self, username: &str) -> Result<User, DbError> {
        let sql = format!(
            "SELECT {} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE u.username = $1",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("user", username))
    }

    /// Look up by email and check the password. `None` on either failure.
    ///
    /// Argon2 verification runs on the blocking pool.
    pub async fn authenticate(
        &self,
        email: &str,
        password: Password,
    ) -> Result<Option<User>, DbError> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        let user = tokio::task::spawn_blocking(move || {
            let verified = user.verify_password(&password);
            verified.then_some(user)
        })
        .await?;
        Ok(user)
    }

    /// Mark the account confirmed if `token` was issued for it.
    ///
    /// Returns whether the token verified. Already-confirmed accounts stay
    /// confirmed either way.
    pub async fn confirm(
        &self,
        user: &User,
        token: &str,
        codec: &TokenCodec,
    ) -> Result<bool, DbError> {
        if !codec.verify_confirmation(token, user.id) {
            return Ok(false);
        }

        sqlx::query("UPDATE users SET confirmed = TRUE WHERE id = $1")
            .bind(user.id)
            .execute(self.pool)
            .await?;

        tracing::info!(user_id = user.id, "account confirmed");
        Ok(true)
    }

    /// Refresh `last_seen`.
    pub async fn ping(&self, id: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET last_seen = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_profile(&self, id: i64, edit: &ProfileEdit) -> Result<User, DbError> {
        let result = sqlx::query(
            "UPDATE users SET name = $2, location = $3, about_me = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(edit.name.as_deref())
        .bind(edit.location.as_deref())
        .bind(edit.about_me.as_deref())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("user", id));
        }
        self.get(id).await
    }

    /// Administrator edit of any account.
    ///
    /// Email and username must be unused by *other* accounts; keeping your
    /// own is fine.
    pub async fn admin_update(&self, id: i64, edit: &AdminEdit) -> Result<User, DbError> {
        let mut tx = self.pool.begin().await?;

        let email_taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id <> $2)",
        )
        .bind(edit.email.as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if email_taken {
            return Err(DbError::Conflict { field: "email" });
        }

        let username_taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
        )
        .bind(edit.username.as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if username_taken {
            return Err(DbError::Conflict { field: "username" });
        }

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, username = $3, confirmed = $4, role_id = $5,
                name = $6, location = $7, about_me = $8, avatar_hash = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(edit.email.as_str())
        .bind(edit.username.as_str())
        .bind(edit.confirmed)
        .bind(edit.role_id)
        .bind(edit.profile.name.as_deref())
        .bind(edit.profile.location.as_deref())
        .bind(edit.profile.about_me.as_deref())
        .bind(avatar_hash(edit.email.as_str()))
        .execute(&mut *tx)
        .await
        .map_err(DbError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("user", id));
        }

        tx.commit().await?;
        tracing::info!(user_id = id, "account edited by administrator");
        self.get(id).await
    }

    /// Number of posts written by the user
    pub async fn post_count(&self, id: i64) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Make every user follow themself. Returns how many follows were added.
    pub async fn add_self_follows(&self) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followed_id)
            SELECT id, id FROM users
            ON CONFLICT DO NOTHING
            "#,
        )
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{test_support, FollowRepo, RoleRepo};
    use chrono::Duration;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_assigns_default_role_and_self_follow() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "cat").await;

        assert_eq!(user.role_name.as_deref(), Some("User"));
        assert!(!user.confirmed);
        assert!(user.can(Permission::WRITE));
        assert!(!user.can(Permission::MODERATE));
        assert_eq!(user.avatar_hash(), avatar_hash(&user.email));
        assert!(FollowRepo::new(&pool)
            .is_following(user.id, user.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_admin_gets_administrator_role() {
        let pool = test_support::pool().await;
        let name = test_support::unique("admin");
        let new = NewUser {
            email: Email::new(&format!("{}@example.com", name)).unwrap(),
            username: Username::new(&name).unwrap(),
            password_hash: PasswordHash::generate(&Password::new("dog")).unwrap(),
        };
        let user = UserRepo::new(&pool).create(new, true).await.unwrap();
        assert!(user.is_administrator());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_email_conflicts() {
        let pool = test_support::pool().await;
        let existing = test_support::user(&pool, "cat").await;

        let new = NewUser {
            email: Email::new(&existing.email).unwrap(),
            username: Username::new(&test_support::unique("dup")).unwrap(),
            password_hash: PasswordHash::generate(&Password::new("cat")).unwrap(),
        };
        let err = UserRepo::new(&pool).create(new, false).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { field: "email" }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn email_case_variant_conflicts() {
        let pool = test_support::pool().await;
        let existing = test_support::user(&pool, "cat").await;

        let new = NewUser {
            email: Email::new(&existing.email.to_uppercase()).unwrap(),
            username: Username::new(&test_support::unique("dup")).unwrap(),
            password_hash: PasswordHash::generate(&Password::new("dog")).unwrap(),
        };
        let err = UserRepo::new(&pool).create(new, false).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { field: "email" }));

        let found = UserRepo::new(&pool)
            .find_by_email(&existing.email.to_uppercase())
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(existing.id));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn authenticate_checks_password() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "cat").await;
        let repo = UserRepo::new(&pool);

        let ok = repo
            .authenticate(&user.email.to_uppercase(), Password::new("cat"))
            .await
            .unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        let bad = repo
            .authenticate(&user.email, Password::new("dog"))
            .await
            .unwrap();
        assert!(bad.is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn confirm_requires_matching_token() {
        let pool = test_support::pool().await;
        let a = test_support::user(&pool, "cat").await;
        let b = test_support::user(&pool, "dog").await;
        let codec = TokenCodec::new("test-secret");
        let repo = UserRepo::new(&pool);

        let token_for_b = codec.issue_confirmation(b.id, Duration::hours(1)).unwrap();
        assert!(!repo.confirm(&a, &token_for_b, &codec).await.unwrap());
        assert!(!repo.get(a.id).await.unwrap().confirmed);

        let token_for_a = codec.issue_confirmation(a.id, Duration::hours(1)).unwrap();
        assert!(repo.confirm(&a, &token_for_a, &codec).await.unwrap());
        assert!(repo.get(a.id).await.unwrap().confirmed);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn ping_moves_last_seen_forward() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "cat").await;
        sqlx::query("UPDATE users SET last_seen = NOW() - INTERVAL '1 day' WHERE id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let repo = UserRepo::new(&pool);
        let before = repo.get(user.id).await.unwrap().last_seen;
        repo.ping(user.id).await.unwrap();
        let after = repo.get(user.id).await.unwrap().last_seen;
        assert!(after > before);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn admin_update_allows_keeping_own_email() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "cat").await;
        let other = test_support::user(&pool, "dog").await;
        let moderator = RoleRepo::new(&pool)
            .by_name(RoleName::Moderator)
            .await
            .unwrap();
        let repo = UserRepo::new(&pool);

        let mut edit = AdminEdit {
            email: Email::new(&user.email).unwrap(),
            username: Username::new(&user.username).unwrap(),
            confirmed: true,
            role_id: moderator.id,
            profile: ProfileEdit {
                name: ProfileField::new("name", Some("Cat")).unwrap(),
                ..ProfileEdit::default()
            },
        };
        let updated = repo.admin_update(user.id, &edit).await.unwrap();
        assert!(updated.confirmed);
        assert!(updated.can(Permission::MODERATE));
        assert_eq!(updated.name.as_deref(), Some("Cat"));

        edit.email = Email::new(&other.email).unwrap();
        let err = repo.admin_update(user.id, &edit).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { field: "email" }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn add_self_follows_backfills() {
        let pool = test_support::pool().await;
        let user = test_support::user(&pool, "cat").await;
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let added = UserRepo::new(&pool).add_self_follows().await.unwrap();
        assert!(added >= 1);
        assert!(FollowRepo::new(&pool)
            .is_following(user.id, user.id)
            .await
            .unwrap());
    }
}
