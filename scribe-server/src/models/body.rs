//! Post and comment body text

use super::ValidationError;

/// Non-blank markdown body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body(String);

impl Body {
    pub fn post(s: Option<&str>) -> Result<Self, ValidationError> {
        Self::parse(s, "Post does not have a body")
    }

    pub fn comment(s: Option<&str>) -> Result<Self, ValidationError> {
        Self::parse(s, "comment does not have a body")
    }

    fn parse(s: Option<&str>, message: &'static str) -> Result<Self, ValidationError> {
        match s {
            Some(s) if !s.trim().is_empty() => Ok(Self(s.to_owned())),
            _ => Err(ValidationError::Missing {
                field: "body",
                message,
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_or_blank() {
        assert!(Body::post(None).is_err());
        assert!(Body::post(Some("")).is_err());
        assert!(Body::comment(Some(" \n\t")).is_err());
    }

    #[test]
    fn keeps_text_verbatim() {
        let body = Body::post(Some("  # Hello\n")).unwrap();
        assert_eq!(body.as_str(), "  # Hello\n");
    }

    #[test]
    fn error_says_what_is_missing() {
        assert_eq!(
            Body::post(None).unwrap_err().to_string(),
            "Post does not have a body"
        );
        assert_eq!(
            Body::comment(Some("  ")).unwrap_err().to_string(),
            "comment does not have a body"
        );
    }
}
