//! Outgoing email
//!
//! Handlers build an [`Email`] and hand it to [`send_email`], which delivers
//! it through the configured [`Mailer`] on a background task.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scribe_core::MailConfig;

/// A rendered message ready to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub sender: String,
}

impl Email {
    /// Build a message from config, prefixing the subject.
    pub fn new(
        config: &MailConfig,
        to: impl Into<String>,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Self {
        Self {
            to: to.into(),
            subject: format!("{} {}", config.subject_prefix, subject),
            text_body,
            html_body,
            sender: config.sender.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail delivery failed: {reason}")]
    Delivery { reason: String },
}

/// Delivers email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            from = %email.sender,
            subject = %email.subject,
            "outgoing email"
        );
        tracing::debug!(body = %email.text_body, "email body");
        Ok(())
    }
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Email>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(email);
        Ok(())
    }
}

/// Deliver `email` without blocking the caller. Failures are logged.
pub fn send_email(mailer: Arc<dyn Mailer>, email: Email) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let to = email.to.clone();
        if let Err(e) = mailer.send(email).await {
            tracing::error!(to = %to, error = %e, "failed to send email");
        }
    })
}

/// The "confirm your account" message
pub fn confirmation_email(
    config: &MailConfig,
    base_url: &str,
    to: &str,
    username: &str,
    token: &str,
) -> Email {
    let link = format!("{}/auth/confirm/{}", base_url, token);

    let text_body = format!(
        "Dear {username},\n\n\
         Welcome to Scribe!\n\n\
         To confirm your account please visit the following link:\n\n\
         {link}\n\n\
         Sincerely,\n\n\
         The Scribe Team\n\n\
         Note: replies to this email address are not monitored.\n"
    );
    let html_body = format!(
        "<p>Dear {username},</p>\n\
         <p>Welcome to <b>Scribe</b>!</p>\n\
         <p>To confirm your account please <a href=\"{link}\">click here</a>.</p>\n\
         <p>Alternatively, you can paste the following link in your browser's address bar:</p>\n\
         <p>{link}</p>\n\
         <p>Sincerely,</p>\n\
         <p>The Scribe Team</p>\n\
         <p><small>Note: replies to this email address are not monitored.</small></p>\n"
    );

    Email::new(config, to, "Confirm Your Account", text_body, html_body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_gets_prefix() {
        let email = confirmation_email(
            &MailConfig::default(),
            "http://localhost:5000",
            "john@example.com",
            "john",
            "abc.def",
        );
        assert_eq!(email.subject, "[Scribe] Confirm Your Account");
        assert_eq!(email.to, "john@example.com");
        assert_eq!(email.sender, MailConfig::default().sender);
    }

    #[test]
    fn bodies_carry_the_link() {
        let email = confirmation_email(
            &MailConfig::default(),
            "http://localhost:5000",
            "john@example.com",
            "john",
            "abc.def",
        );
        let link = "http://localhost:5000/auth/confirm/abc.def";
        assert!(email.text_body.contains(link));
        assert!(email.text_body.starts_with("Dear john,"));
        assert!(email.html_body.contains(&format!("href=\"{}\"", link)));
    }

    #[tokio::test]
    async fn send_email_reaches_mailer() {
        let mailer = Arc::new(MemoryMailer::new());
        let email = Email::new(
            &MailConfig::default(),
            "a@example.com",
            "Hi",
            "text".into(),
            "<p>html</p>".into(),
        );

        send_email(mailer.clone(), email.clone()).await.unwrap();

        assert_eq!(mailer.sent(), vec![email]);
    }

    #[tokio::test]
    async fn log_mailer_accepts_everything() {
        let email = Email::new(
            &MailConfig::default(),
            "a@example.com",
            "Hi",
            "text".into(),
            String::new(),
        );
        assert!(LogMailer.send(email).await.is_ok());
    }
}
