//! Gravatar helpers
//!
//! The MD5 of the lowercased email is cached on the user row and refreshed
//! whenever the email changes.

/// Hex MD5 of the lowercased email
pub fn avatar_hash(email: &str) -> String {
    format!("{:x}", md5::compute(email.trim().to_lowercase().as_bytes()))
}

/// Gravatar image URL for a cached hash
pub fn gravatar_url(hash: &str, size: u32, secure: bool) -> String {
    let base = if secure {
        "https://secure.gravatar.com/avatar"
    } else {
        "http://www.gravatar.com/avatar"
    };
    format!("{}/{}?s={}&d=identicon&r=g", base, hash, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ignores_case() {
        assert_eq!(avatar_hash("John@Example.com"), avatar_hash("john@example.com"));
        assert_eq!(avatar_hash("john@example.com").len(), 32);
    }

    #[test]
    fn known_hash() {
        assert_eq!(
            avatar_hash("john@example.com"),
            "d4c74594d841139328695756648b6bd6"
        );
    }

    #[test]
    fn url_shape() {
        let url = gravatar_url("abc", 256, true);
        assert_eq!(
            url,
            "https://secure.gravatar.com/avatar/abc?s=256&d=identicon&r=g"
        );
        assert!(gravatar_url("abc", 100, false).starts_with("http://www.gravatar.com/avatar/abc"));
    }
}
