/// Structured error types for scribe-core.
///
/// Library consumers get `thiserror` enums; the `scribe` binary wraps them
/// in `anyhow` at the edges.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scribe-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Config file could not be parsed
    #[error("Invalid config file {path:?}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// Configuration is present but unusable
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Password could not be hashed
    #[error("Password error: {reason}")]
    Password { reason: String },

    /// Token could not be signed
    #[error("Token error: {reason}")]
    Token { reason: String },
}

/// Result type alias for scribe-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a config parse error
    pub fn config_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a password error
    pub fn password(reason: impl Into<String>) -> Self {
        Self::Password {
            reason: reason.into(),
        }
    }

    /// Create a token error
    pub fn token(reason: impl Into<String>) -> Self {
        Self::Token {
            reason: reason.into(),
        }
    }
}
