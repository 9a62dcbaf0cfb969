//! HTTP server layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing and a request timeout
//! - Graceful shutdown
//! - JSON error responses
//! - Per-request Basic/Bearer authentication

pub mod error;
pub mod extractors;
pub mod json;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, ServerConfig, ServerError};
