//! Role repository
//!
//! Roles are seeded by `insert_roles`, which is idempotent: running it again
//! resets each known role to its canonical permission set.

use scribe_core::{Permission, RoleName};
use sqlx::{FromRow, PgPool};

use super::DbError;

/// Role record from database
#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub is_default: bool,
    pub permissions: i32,
}

impl Role {
    pub fn permission_set(&self) -> Permission {
        Permission::from_stored(self.permissions)
    }
}

/// Role repository
pub struct RoleRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> RoleRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create or reset the User, Moderator and Administrator roles.
    pub async fn insert_roles(&self) -> Result<Vec<Role>, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut roles = Vec::with_capacity(RoleName::ALL.len());

        for name in RoleName::ALL {
            let role = sqlx::query_as::<_, Role>(
                r#"
                INSERT INTO roles (name, is_default, permissions)
                VALUES ($1, $2, $3)
                ON CONFLICT (name) DO UPDATE
                    SET is_default = EXCLUDED.is_default,
                        permissions = EXCLUDED.permissions
                RETURNING id, name, is_default, permissions
                "#,
            )
            .bind(name.as_str())
            .bind(name.is_default())
            .bind(name.permissions().bits())
            .fetch_one(&mut *tx)
            .await?;

            tracing::debug!(role = %role.name, permissions = role.permissions, "role upserted");
            roles.push(role);
        }

        tx.commit().await?;
        Ok(roles)
    }

    /// All roles, lowest permission set first
    pub async fn list(&self) -> Result<Vec<Role>, DbError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, is_default, permissions FROM roles ORDER BY permissions, id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn get(&self, id: i64) -> Result<Role, DbError> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, is_default, permissions FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("role", id))
    }

    pub async fn by_name(&self, name: RoleName) -> Result<Role, DbError> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, is_default, permissions FROM roles WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("role", name))
    }

    /// The role new accounts receive. `None` until roles are seeded.
    pub async fn default_role(&self) -> Result<Option<Role>, DbError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, is_default, permissions FROM roles WHERE is_default ORDER BY id LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;
        Ok(role)
    }
}
