//! Listener, middleware stack and shutdown
//!
//! CORS only admits the local development origins unless
//! `cors_permissive` is set. Requests are traced and cut off after
//! `request_timeout`. Ctrl+C or SIGTERM drains in-flight requests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use scribe_core::ServerSettings;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::state::AppState;

const LOCAL_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5000",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5000",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Any origin may call the API. Off by default.
    pub cors_permissive: bool,
    /// Slower requests are answered with 408
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cors_permissive: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Listener settings from the `[server]` config table.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self, ServerError> {
        let bind_addr = settings
            .bind
            .parse()
            .map_err(|_| ServerError::InvalidBind {
                bind: settings.bind.clone(),
            })?;

        Ok(Self {
            bind_addr,
            cors_permissive: settings.cors_permissive,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        })
    }
}

fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS is permissive: every origin may call the API");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(LOCAL_ORIGINS.map(HeaderValue::from_static))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Every route behind timeout, CORS and request tracing
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    routes::router()
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors_layer(config.cors_permissive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM.
///
/// ```ignore
/// let state = AppState::new(pool, config, Arc::new(LogMailer))?;
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    tracing::info!(base_url = %state.base_url, profile = %state.config.profile, "starting scribe");
    let app = build_router(Arc::new(state), &config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind_addr,
            source,
        })?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolves on the first of Ctrl+C or SIGTERM. A signal that can't be
/// installed never fires.
async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "interrupt",
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for Ctrl+C");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "terminate"
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let signal = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    tracing::info!(signal, "draining connections");
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid bind address '{bind}'")]
    InvalidBind { bind: String },

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
