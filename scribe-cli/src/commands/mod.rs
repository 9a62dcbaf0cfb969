pub mod config;
pub mod db;
pub mod serve;

pub use config::run_config;
pub use db::{run_db, run_deploy, run_roles, run_users};
pub use serve::run_serve;
