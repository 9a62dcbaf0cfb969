//! `scribe serve`: run the HTTP API
//!
//! Migrates the schema and seeds roles before listening, so a fresh
//! database is usable straight away.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use scribe_core::ScribeConfig;
use scribe_server::db::{create_pool, migrations, RoleRepo};
use scribe_server::mail::LogMailer;
use scribe_server::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides server.bind, default 127.0.0.1:5000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

impl ServeArgs {
    /// Fold command-line overrides into the loaded config.
    fn apply(&self, config: &mut ScribeConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind.to_string();
        }
        if self.cors_permissive {
            config.server.cors_permissive = true;
        }
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
    }
}

/// Run the HTTP server until shutdown
pub async fn run_serve(args: ServeArgs, mut config: ScribeConfig) -> Result<()> {
    args.apply(&mut config);
    config.validate().context("Configuration is not servable")?;

    let server_config = ServerConfig::from_settings(&config.server)?;

    let pool = create_pool(&config.database_url())
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool)
        .await
        .context("Failed to migrate database")?;
    RoleRepo::new(&pool)
        .insert_roles()
        .await
        .context("Failed to seed roles")?;

    let state = AppState::new(pool, config, Arc::new(LogMailer))
        .context("Failed to build application state")?;

    // Blocks until shutdown
    run_server(state, server_config)
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let mut config = ScribeConfig::default();
        let args = ServeArgs {
            bind: Some(SocketAddr::from(([0, 0, 0, 0], 8080))),
            cors_permissive: true,
            database_url: Some("postgres://db/scribe".into()),
        };

        args.apply(&mut config);

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(config.server.cors_permissive);
        assert_eq!(config.database_url(), "postgres://db/scribe");
    }

    #[test]
    fn missing_overrides_keep_config() {
        let mut config = ScribeConfig::default();
        let args = ServeArgs {
            bind: None,
            cors_permissive: false,
            database_url: None,
        };

        args.apply(&mut config);

        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert!(!config.server.cors_permissive);
    }
}
