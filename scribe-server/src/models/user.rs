//! Account field validation
//!
//! Usernames: letter first, then letters, digits, dots or underscores.
//! Emails: 1-64 chars with a basic `local@domain.tld` shape.

use once_cell::sync::Lazy;
use regex::Regex;
use scribe_core::Password;

use super::ValidationError;

/// Maximum length for usernames, emails and short profile fields
const MAX_FIELD_LEN: usize = 64;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.]*$").expect("invalid username regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex"));

fn check_len(field: &'static str, s: &str) -> Result<(), ValidationError> {
    if s.chars().count() > MAX_FIELD_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_FIELD_LEN,
        });
    }
    Ok(())
}

/// Validated username
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a new username.
    ///
    /// # Example
    /// ```
    /// use scribe_server::models::Username;
    ///
    /// assert!(Username::new("john.doe_2").is_ok());
    /// assert!(Username::new("2john").is_err());  // must start with a letter
    /// assert!(Username::new("john doe").is_err());  // no spaces
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }
        check_len("username", s)?;

        if !USERNAME_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "Usernames must have only letters, numbers, dots or underscores",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        check_len("email", s)?;

        if !EMAIL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "Invalid email address.",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Optional short profile text (real name, location), at most 64 chars
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileField(Option<String>);

impl ProfileField {
    pub fn new(field: &'static str, value: Option<&str>) -> Result<Self, ValidationError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self(None)),
            Some(s) => {
                check_len(field, s)?;
                Ok(Self(Some(s.to_owned())))
            }
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Password chosen at registration, confirmed by typing it twice
#[derive(Debug)]
pub struct NewPassword(Password);

impl NewPassword {
    pub fn new(password: &str, confirmation: &str) -> Result<Self, ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::Empty { field: "password" });
        }
        if password != confirmation {
            return Err(ValidationError::Mismatch {
                field: "password",
                reason: "Passwords do not match.",
            });
        }
        Ok(Self(Password::new(password)))
    }

    pub fn password(&self) -> &Password {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_usernames() {
        assert!(Username::new("john").is_ok());
        assert!(Username::new("John.Doe").is_ok());
        assert!(Username::new("j_2").is_ok());
    }

    #[test]
    fn rejects_bad_usernames() {
        assert!(matches!(
            Username::new("").unwrap_err(),
            ValidationError::Empty { .. }
        ));
        assert!(matches!(
            Username::new("_john").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
        assert!(matches!(
            Username::new("john-doe").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
        assert!(matches!(
            Username::new(&"a".repeat(65)).unwrap_err(),
            ValidationError::TooLong { max: 64, .. }
        ));
    }

    #[test]
    fn email_shape() {
        assert!(Email::new("john@example.com").is_ok());
        assert_eq!(Email::new("  john@example.com ").unwrap().as_str(), "john@example.com");
        assert!(Email::new("john@example").is_err());
        assert!(Email::new("john.example.com").is_err());
        assert!(Email::new("").is_err());
    }

    #[test]
    fn profile_field_blank_is_none() {
        assert_eq!(ProfileField::new("name", None).unwrap().as_deref(), None);
        assert_eq!(ProfileField::new("name", Some("   ")).unwrap().as_deref(), None);
        assert_eq!(
            ProfileField::new("location", Some("Paris")).unwrap().as_deref(),
            Some("Paris")
        );
        assert!(ProfileField::new("location", Some(&"x".repeat(65))).is_err());
    }

    #[test]
    fn passwords_must_match() {
        assert!(NewPassword::new("cat", "cat").is_ok());
        assert!(matches!(
            NewPassword::new("cat", "dog").unwrap_err(),
            ValidationError::Mismatch { .. }
        ));
        assert!(matches!(
            NewPassword::new("", "").unwrap_err(),
            ValidationError::Empty { .. }
        ));
    }
}
