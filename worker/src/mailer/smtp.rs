//! SMTP dispatcher implementation.
//!
//! Renders the bundled HTML templates and submits through an async SMTP
//! relay. Personalization is plain placeholder substitution; no template
//! engine.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{EmailDispatcher, MailerError, SendConfirmation};

const VERIFY_EMAIL_TEMPLATE: &str = include_str!("templates/verify_email.html");
const RESET_PASSWORD_TEMPLATE: &str = include_str!("templates/reset_password.html");

const VERIFY_EMAIL_SUBJECT: &str = "Email verification";
const RESET_PASSWORD_SUBJECT: &str = "Password reset";

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Relay hostname.
    pub host: String,
    /// Submission port, usually 587.
    pub port: u16,
    /// Relay login.
    pub username: String,
    /// Relay password.
    pub password: String,
    /// Display name on the From header.
    pub from_name: String,
    /// Sender address.
    pub from_address: String,
}

/// Dispatcher backed by an async SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the relay transport and sender mailbox from config.
    ///
    /// No connection is made here; the relay is contacted per send.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from = format!("{} <{}>", config.from_name, config.from_address).parse()?;

        Ok(Self { transport, from })
    }

    async fn deliver(
        &self,
        to: &str,
        subject: &str,
        html: String,
    ) -> Result<SendConfirmation, MailerError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        let response = self.transport.send(message).await?;

        info!(
            to = %to,
            subject = %subject,
            code = %response.code(),
            "smtp_message_accepted"
        );

        Ok(SendConfirmation {
            response: response.code().to_string(),
        })
    }
}

/// Substitute the `{{link}}` and `{{firstName}}` placeholders.
fn render(template: &str, link: &str, first_name: &str) -> String {
    template
        .replace("{{link}}", link)
        .replace("{{firstName}}", first_name)
}

#[async_trait]
impl EmailDispatcher for SmtpMailer {
    async fn send_verification(
        &self,
        email: &str,
        link: &str,
        first_name: &str,
    ) -> Result<SendConfirmation, MailerError> {
        let html = render(VERIFY_EMAIL_TEMPLATE, link, first_name);
        self.deliver(email, VERIFY_EMAIL_SUBJECT, html).await
    }

    async fn send_password_reset(
        &self,
        email: &str,
        link: &str,
        first_name: &str,
    ) -> Result<SendConfirmation, MailerError> {
        let html = render(RESET_PASSWORD_TEMPLATE, link, first_name);
        self.deliver(email, RESET_PASSWORD_SUBJECT, html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_both_placeholders() {
        let html = render(VERIFY_EMAIL_TEMPLATE, "https://x/verify?token=abc", "Ana");

        assert!(html.contains("https://x/verify?token=abc"));
        assert!(html.contains("Ana"));
        assert!(!html.contains("{{link}}"));
        assert!(!html.contains("{{firstName}}"));
    }

    #[test]
    fn test_reset_template_substitutes_both_placeholders() {
        let html = render(RESET_PASSWORD_TEMPLATE, "https://x/reset?token=def", "Cleo");

        assert!(html.contains("https://x/reset?token=def"));
        assert!(html.contains("Cleo"));
        assert!(!html.contains("{{link}}"));
        assert!(!html.contains("{{firstName}}"));
    }

    #[test]
    fn test_mailer_builds_from_config() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer@example.com".to_string(),
            password: "secret".to_string(),
            from_name: "Notifications".to_string(),
            from_address: "mailer@example.com".to_string(),
        };

        assert!(SmtpMailer::new(&config).is_ok());
    }

    #[test]
    fn test_mailer_rejects_invalid_from_address() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer@example.com".to_string(),
            password: "secret".to_string(),
            from_name: "Notifications".to_string(),
            from_address: "not an address".to_string(),
        };

        assert!(matches!(
            SmtpMailer::new(&config),
            Err(MailerError::Address(_))
        ));
    }
}
