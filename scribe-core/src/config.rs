//! Layered configuration: defaults, then an optional TOML file, then
//! environment variables (after loading `.env` through dotenvy).

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// Deployment profile; selects which database URL variable is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Development,
    Testing,
    Production,
}

impl Profile {
    /// Environment variable carrying the database URL for this profile
    pub fn database_env(&self) -> &'static str {
        match self {
            Self::Development => "DEV_DATABASE_URL",
            Self::Testing => "TEST_DATABASE_URL",
            Self::Production => "DATABASE_URL",
        }
    }

    pub fn default_database_url(&self) -> &'static str {
        match self {
            Self::Development => "postgres://localhost/scribe_dev",
            Self::Testing => "postgres://localhost/scribe_test",
            Self::Production => "postgres://localhost/scribe",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        })
    }
}

impl FromStr for Profile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "default" => Ok(Self::Development),
            "testing" => Ok(Self::Testing),
            "production" => Ok(Self::Production),
            other => Err(CoreError::config(format!("unknown profile '{}'", other))),
        }
    }
}

/// Outgoing mail settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub subject_prefix: String,
    pub sender: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: "smtp.googlemail.com".to_string(),
            port: 587,
            use_tls: true,
            username: None,
            password: None,
            subject_prefix: "[Scribe]".to_string(),
            sender: "Scribe Admin <noreply@scribe.local>".to_string(),
        }
    }
}

/// Page sizes for list endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub posts_per_page: u32,
    pub follows_per_page: u32,
    pub comments_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            posts_per_page: 15,
            follows_per_page: 10,
            comments_per_page: 10,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    /// Externally visible base URL for links; defaults to `http://{bind}`
    pub public_url: Option<String>,
    pub cors_permissive: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            public_url: None,
            cors_permissive: false,
            request_timeout_secs: 30,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScribeConfig {
    pub profile: Profile,
    pub secret_key: Option<String>,
    pub database_url: Option<String>,
    /// Accounts registered with this email become administrators
    pub admin_email: Option<String>,
    pub mail: MailConfig,
    pub pagination: PaginationConfig,
    pub server: ServerSettings,
}

impl ScribeConfig {
    /// Load config: defaults, then `path` (or `~/.scribe/config.toml` if it
    /// exists), then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CoreError::config_parse(path, e.to_string()))
    }

    /// Default config file path: ~/.scribe/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".scribe/config.toml")
    }

    /// Overlay environment variables. `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(profile) = lookup("SCRIBE_PROFILE") {
            self.profile = profile.parse()?;
        }
        if let Some(secret) = lookup("SECRET_KEY") {
            self.secret_key = Some(secret);
        }
        if let Some(url) = lookup(self.profile.database_env()) {
            self.database_url = Some(url);
        }
        if let Some(admin) = lookup("SCRIBE_ADMIN") {
            self.admin_email = Some(admin);
        }

        if let Some(server) = lookup("MAIL_SERVER") {
            self.mail.server = server;
        }
        if let Some(port) = lookup("MAIL_PORT") {
            self.mail.port = parse_env("MAIL_PORT", &port)?;
        }
        if let Some(tls) = lookup("MAIL_USE_TLS") {
            self.mail.use_tls = matches!(tls.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(username) = lookup("MAIL_USERNAME") {
            self.mail.username = Some(username);
        }
        if let Some(password) = lookup("MAIL_PASSWORD") {
            self.mail.password = Some(password);
        }
        if let Some(prefix) = lookup("SCRIBE_MAIL_SUBJECT_PREFIX") {
            self.mail.subject_prefix = prefix;
        }
        if let Some(sender) = lookup("SCRIBE_MAIL_SENDER") {
            self.mail.sender = sender;
        }

        if let Some(n) = lookup("SCRIBE_POSTS_PER_PAGE") {
            self.pagination.posts_per_page = parse_env("SCRIBE_POSTS_PER_PAGE", &n)?;
        }
        if let Some(n) = lookup("SCRIBE_FOLLOWS_PER_PAGE") {
            self.pagination.follows_per_page = parse_env("SCRIBE_FOLLOWS_PER_PAGE", &n)?;
        }
        if let Some(n) = lookup("SCRIBE_COMMENTS_PER_PAGE") {
            self.pagination.comments_per_page = parse_env("SCRIBE_COMMENTS_PER_PAGE", &n)?;
        }
        if let Some(bind) = lookup("SCRIBE_BIND") {
            self.server.bind = bind;
        }
        if let Some(url) = lookup("SCRIBE_PUBLIC_URL") {
            self.server.public_url = Some(url);
        }

        Ok(())
    }

    /// Database URL, falling back to the profile default
    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| self.profile.default_database_url().to_string())
    }

    /// Base URL for links in JSON bodies and emails, without trailing slash
    pub fn public_url(&self) -> String {
        match self.server.public_url.as_deref() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.server.bind),
        }
    }

    /// Secret key used to sign tokens. Required to serve.
    pub fn secret_key(&self) -> Result<&str> {
        match self.secret_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(CoreError::config(
                "SECRET_KEY is not set (set it in the environment or config file)",
            )),
        }
    }

    /// True when `email` is the configured administrator address
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email))
    }

    /// Check that the config can run a server
    pub fn validate(&self) -> Result<()> {
        self.secret_key()?;

        let pages = &self.pagination;
        if pages.posts_per_page == 0 || pages.follows_per_page == 0 || pages.comments_per_page == 0 {
            return Err(CoreError::config("page sizes must be greater than zero"));
        }

        Ok(())
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if shown.secret_key.is_some() {
            shown.secret_key = Some("********".to_string());
        }
        if shown.mail.password.is_some() {
            shown.mail.password = Some("********".to_string());
        }
        shown
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CoreError::config(format!("{} has an invalid value '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ScribeConfig::default();
        assert_eq!(config.profile, Profile::Development);
        assert_eq!(config.pagination.posts_per_page, 15);
        assert_eq!(config.pagination.follows_per_page, 10);
        assert_eq!(config.pagination.comments_per_page, 10);
        assert_eq!(config.mail.port, 587);
        assert_eq!(config.database_url(), "postgres://localhost/scribe_dev");
    }

    #[test]
    fn env_overrides_follow_profile() {
        let mut config = ScribeConfig::default();
        config
            .apply_env(lookup_from(&[
                ("SCRIBE_PROFILE", "testing"),
                ("DATABASE_URL", "postgres://prod/db"),
                ("TEST_DATABASE_URL", "postgres://test/db"),
                ("SECRET_KEY", "s3cret"),
                ("MAIL_PORT", "2525"),
            ]))
            .unwrap();

        assert_eq!(config.profile, Profile::Testing);
        assert_eq!(config.database_url(), "postgres://test/db");
        assert_eq!(config.secret_key().unwrap(), "s3cret");
        assert_eq!(config.mail.port, 2525);
    }

    #[test]
    fn public_url_falls_back_to_bind() {
        let mut config = ScribeConfig::default();
        assert_eq!(config.public_url(), "http://127.0.0.1:5000");

        config
            .apply_env(lookup_from(&[("SCRIBE_PUBLIC_URL", "https://scribe.example/")]))
            .unwrap();
        assert_eq!(config.public_url(), "https://scribe.example");
    }

    #[test]
    fn bad_env_number_is_an_error() {
        let mut config = ScribeConfig::default();
        let err = config
            .apply_env(lookup_from(&[("SCRIBE_POSTS_PER_PAGE", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("SCRIBE_POSTS_PER_PAGE"));
    }

    #[test]
    fn missing_secret_fails_validation() {
        let config = ScribeConfig::default();
        assert!(config.validate().is_err());

        let config = ScribeConfig {
            secret_key: Some(String::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_page_size_fails_validation() {
        let mut config = ScribeConfig {
            secret_key: Some("k".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.pagination.comments_per_page = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn admin_email_match_ignores_case() {
        let config = ScribeConfig {
            admin_email: Some("Boss@Example.com".into()),
            ..Default::default()
        };
        assert!(config.is_admin_email("boss@example.com"));
        assert!(!config.is_admin_email("other@example.com"));
    }

    #[test]
    fn loads_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
profile = "production"
secret_key = "from-file"

[pagination]
posts_per_page = 25
"#
        )
        .unwrap();

        let config = ScribeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.profile, Profile::Production);
        assert_eq!(config.secret_key.as_deref(), Some("from-file"));
        assert_eq!(config.pagination.posts_per_page, 25);
        assert_eq!(config.pagination.comments_per_page, 10);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "profile = [").unwrap();

        let err = ScribeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse { .. }));
    }

    #[test]
    fn redacted_masks_secrets() {
        let mut config = ScribeConfig {
            secret_key: Some("k".into()),
            ..Default::default()
        };
        config.mail.password = Some("p".into());

        let shown = config.redacted();
        assert_eq!(shown.secret_key.as_deref(), Some("********"));
        assert_eq!(shown.mail.password.as_deref(), Some("********"));
    }
}
