//! Database layer - connection pool, schema and repositories
//!
//! # Design Principles
//!
//! - Connection pool, never a shared connection behind a mutex
//! - List operations use JOINs and `COUNT(*) OVER()`; no N+1 queries
//! - Rely on DB constraints and map conflicts; no check-then-insert races
//! - Transactions for multi-step writes (user creation + self-follow)

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{connect, connect_lazy, create_pool, PoolLimits};
pub use repos::*;
