//! Outbound mail delivery over authenticated SMTP.

mod error;

use super::MailTransport;
use crate::core::config::Config;
use crate::core::error::{AppError, DeliveryError, Result};
use error::classify_smtp_error;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Sends plain-text messages through a STARTTLS relay with username/password auth.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from.to_string()).finish()
    }
}

impl SmtpMailer {
    /// Builds the mailer from the SMTP section of `config`.
    ///
    /// Fails when credentials are missing or the sender address does not parse.
    pub fn new(config: &Config) -> Result<Self> {
        let username = config.smtp_username.clone().ok_or_else(|| {
            AppError::Config(
                "SMTP username is required (set [smtp].username or EMAIL_COURIER_SMTP_USERNAME)."
                    .to_string(),
            )
        })?;
        let password = config.smtp_password.clone().ok_or_else(|| {
            AppError::Config(
                "SMTP password is required (set [smtp].password or EMAIL_COURIER_SMTP_PASSWORD)."
                    .to_string(),
            )
        })?;
        let sender = config.sender().unwrap_or(username.as_str());
        let from: Mailbox = sender
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid sender address '{}': {}", sender, e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| {
                AppError::Initialization(format!(
                    "Failed to configure SMTP relay '{}': {}",
                    config.smtp_host, e
                ))
            })?
            .port(config.smtp_port)
            .credentials(Credentials::new(username, password))
            .timeout(Some(config.request_timeout))
            .build();

        tracing::debug!(target: "smtp_task", "SMTP transport configured for {}:{}", config.smtp_host, config.smtp_port);
        Ok(Self { transport, from })
    }

    /// Opens a connection and authenticates without sending anything.
    pub async fn test_connection(&self) -> Result<()> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::Initialization(
                "SMTP server did not accept the connection test".to_string(),
            )),
            Err(e) => Err(AppError::Initialization(format!(
                "SMTP connection test failed: {}",
                e
            ))),
        }
    }

    fn build_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> std::result::Result<Message, DeliveryError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
                address: recipient.to_string(),
                message: e.to_string(),
            })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> std::result::Result<(), DeliveryError> {
        let message = self.build_message(recipient, subject, body)?;
        tracing::debug!(target: "smtp_task", "Sending message to <{}>", recipient);

        match self.transport.send(message).await {
            Ok(response) => {
                tracing::debug!(target: "smtp_task", "Server accepted message for <{}>: {:?}", recipient, response.code());
                Ok(())
            }
            Err(e) => Err(classify_smtp_error(&e, recipient)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_credentials() -> Config {
        Config {
            smtp_username: Some("me@example.com".to_string()),
            smtp_password: Some("app-password".to_string()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_requires_credentials() {
        let config = Config::default();
        assert!(matches!(SmtpMailer::new(&config), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_builds_plain_text_message() {
        let mailer = SmtpMailer::new(&config_with_credentials()).unwrap();
        let message = mailer
            .build_message("hr@acme.io", "Hello", "Body text")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("From: me@example.com"));
        assert!(raw.contains("To: hr@acme.io"));
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("Body text"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_delivery_error() {
        let mailer = SmtpMailer::new(&config_with_credentials()).unwrap();
        let err = mailer.build_message("not an address", "s", "b").unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { .. }));
    }
}
