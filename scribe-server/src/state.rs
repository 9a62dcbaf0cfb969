//! Application state shared across handlers

use std::sync::Arc;

use scribe_core::{PaginationConfig, ScribeConfig, TokenCodec};
use sqlx::PgPool;

use crate::mail::Mailer;

/// Shared application state, handed to routers as `Arc<AppState>`
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<ScribeConfig>,
    pub tokens: TokenCodec,
    pub mailer: Arc<dyn Mailer>,
    /// Prefix for every URL written into a response or email
    pub base_url: String,
}

impl AppState {
    /// Fails when no secret key is configured.
    pub fn new(
        pool: PgPool,
        config: ScribeConfig,
        mailer: Arc<dyn Mailer>,
    ) -> scribe_core::Result<Self> {
        let tokens = TokenCodec::new(config.secret_key()?);
        let base_url = config.public_url();

        Ok(Self {
            pool,
            config: Arc::new(config),
            tokens,
            mailer,
            base_url,
        })
    }

    pub fn pages(&self) -> PaginationConfig {
        self.config.pagination
    }

    /// Absolute URL for an API path such as `/api/v1/posts/1`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("base_url", &self.base_url)
            .field("profile", &self.config.profile)
            .finish_non_exhaustive()
    }
}
