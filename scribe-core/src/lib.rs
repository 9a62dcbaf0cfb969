pub mod config;
pub mod error;
pub mod markup;
pub mod password;
pub mod permission;
pub mod token;

pub use config::{MailConfig, PaginationConfig, Profile, ScribeConfig, ServerSettings};
pub use error::{CoreError, Result};
pub use markup::{render_comment, render_post};
pub use password::{Password, PasswordHash};
pub use permission::{Permission, RoleName, Viewer};
pub use token::{TokenCodec, AUTH_TTL_SECS, CONFIRMATION_TTL_SECS};
