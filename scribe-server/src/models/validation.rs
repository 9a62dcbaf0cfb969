//! Validation error types

use std::fmt;

/// Validation error for domain inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Required content is absent; `message` is shown as is
    Missing { field: &'static str, message: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Two fields that must agree don't
    Mismatch { field: &'static str, reason: &'static str },

    /// Value is already taken by another account
    Taken { field: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::Missing { message, .. } => f.write_str(message),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::Mismatch { reason, .. } => f.write_str(reason),
            Self::Taken { field } => write!(f, "{} already in use", field),
        }
    }
}

impl std::error::Error for ValidationError {}
