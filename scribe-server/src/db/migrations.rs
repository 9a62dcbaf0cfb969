//! Schema creation for roles, users, posts, comments and follows
//!
//! Every statement is idempotent so `run` is safe on every startup.

use sqlx::PgPool;

use super::repos::DbError;

/// Create all tables and indexes that don't exist yet
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS roles (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(64) NOT NULL UNIQUE,
            is_default BOOLEAN NOT NULL DEFAULT FALSE,
            permissions INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            email VARCHAR(64) NOT NULL,
            username VARCHAR(64) NOT NULL,
            password_hash TEXT NOT NULL,
            confirmed BOOLEAN NOT NULL DEFAULT FALSE,
            role_id BIGINT REFERENCES roles(id) ON DELETE SET NULL,
            avatar_hash VARCHAR(32),
            name VARCHAR(64),
            location VARCHAR(64),
            about_me TEXT,
            member_since TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            last_seen TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT users_username_key UNIQUE (username)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id BIGSERIAL PRIMARY KEY,
            body TEXT NOT NULL,
            body_html TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id BIGSERIAL PRIMARY KEY,
            body TEXT NOT NULL,
            body_html TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            disabled BOOLEAN NOT NULL DEFAULT FALSE,
            author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS follows (
            follower_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            followed_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (follower_id, followed_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}

async fn create_indexes(pool: &PgPool) -> Result<(), DbError> {
    // Emails are looked up case-insensitively, so they must be unique that way
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_key ON users (LOWER(email))",
    )
    .execute(pool)
    .await?;
    sqlx::query("ALTER TABLE users DROP CONSTRAINT IF EXISTS users_email_key")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_roles_default ON roles(is_default)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_created ON comments(created_at DESC)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_follows_followed ON follows(followed_id)")
        .execute(pool)
        .await?;

    Ok(())
}
