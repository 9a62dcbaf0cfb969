//! scribe-server: social blogging HTTP API
//!
//! Users publish markdown posts, comment on them and follow each other;
//! moderators hide comments and administrators manage accounts. Everything
//! is served as JSON over axum with Postgres storage.

pub mod db;
pub mod http;
pub mod mail;
pub mod models;
pub mod state;

pub use http::{build_router, run_server, ServerConfig};
pub use state::AppState;
