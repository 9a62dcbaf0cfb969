//! Postgres pool construction

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Limits applied to every pool
#[derive(Debug, Clone, Copy)]
pub struct PoolLimits {
    pub max_connections: u32,
    /// A request waiting longer than this for a connection fails
    pub acquire_timeout: Duration,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolLimits {
    fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Connect with default limits; fails fast when the database is down.
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/scribe").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    connect(database_url, PoolLimits::default()).await
}

pub async fn connect(database_url: &str, limits: PoolLimits) -> Result<PgPool, sqlx::Error> {
    limits.options().connect(database_url).await
}

/// Pool that connects on first use. Only the URL is checked up front.
pub fn connect_lazy(database_url: &str, limits: PoolLimits) -> Result<PgPool, sqlx::Error> {
    limits.options().connect_lazy(database_url)
}
