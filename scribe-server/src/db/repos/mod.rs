//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Handles conflicts via ON CONFLICT or the unique constraint error
//! - Uses transactions for multi-step operations

pub mod comments;
pub mod follows;
pub mod posts;
pub mod roles;
pub mod users;

pub use comments::{Comment, CommentRepo};
pub use follows::{FollowEntry, FollowRepo};
pub use posts::{Post, PostRepo};
pub use roles::{Role, RoleRepo};
pub use users::{AdminEdit, NewUser, ProfileEdit, User, UserRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{field} already in use")]
    Conflict { field: &'static str },

    #[error("blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Map unique violations on the users table to a field-level conflict.
    ///
    /// A unique index reports its own name as the constraint.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some("users_email_lower_key") => return Self::Conflict { field: "email" },
                    Some("users_username_key") => return Self::Conflict { field: "username" },
                    _ => {}
                }
            }
        }
        Self::Sqlx(err)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicU32, Ordering};

    use scribe_core::{Password, PasswordHash};
    use sqlx::PgPool;

    use super::{NewUser, RoleRepo, User, UserRepo};
    use crate::db::migrations;
    use crate::models::{Email, Username};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Connect to `DATABASE_URL`, migrate and seed roles.
    pub async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("connect failed");
        migrations::run(&pool).await.expect("migrations failed");
        RoleRepo::new(&pool)
            .insert_roles()
            .await
            .expect("role seeding failed");
        pool
    }

    /// A name no other test run has used.
    pub fn unique(prefix: &str) -> String {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{}{}x{}", prefix, nanos % 1_000_000_000_000, n)
    }

    pub async fn user(pool: &PgPool, password: &str) -> User {
        let name = unique("u");
        let new = NewUser {
            email: Email::new(&format!("{}@example.com", name)).expect("email"),
            username: Username::new(&name).expect("username"),
            password_hash: PasswordHash::generate(&Password::new(password)).expect("hash"),
        };
        UserRepo::new(pool)
            .create(new, false)
            .await
            .expect("user creation failed")
    }
}
