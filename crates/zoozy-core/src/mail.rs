use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetMail {
    pub to_email: String,
    pub display_name: String,
    pub reset_url: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, mail: PasswordResetMail) -> Result<(), MailError>;
}

/// Writes outgoing mail to the log instead of a relay.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, mail: PasswordResetMail) -> Result<(), MailError> {
        tracing::info!(
            from = %self.from,
            to = %mail.to_email,
            display_name = %mail.display_name,
            reset_url = %mail.reset_url,
            "password reset mail"
        );
        Ok(())
    }
}
