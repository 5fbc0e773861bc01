//! Email delivery module.
//!
//! Defines the dispatcher seam the poller is built against, an SMTP
//! implementation, and a recording mock for tests.

pub mod mock;
pub mod smtp;

pub use mock::MockMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

use async_trait::async_trait;
use thiserror::Error;

/// Confirmation returned by a successful send.
#[derive(Debug, Clone)]
pub struct SendConfirmation {
    /// Provider reply for the accepted submission.
    pub response: String,
}

/// Errors raised while building or submitting an email.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build email message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("email rejected: {0}")]
    Rejected(String),
}

/// Outbound email dispatcher.
///
/// Awaited by the poller before the delete decision: a non-error return is
/// unconditional success, any error is failure and leaves the message for
/// redelivery. Redelivery means an operation can run more than once for the
/// same job; duplicate sends are accepted.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// Send the email-verification message.
    async fn send_verification(
        &self,
        email: &str,
        link: &str,
        first_name: &str,
    ) -> Result<SendConfirmation, MailerError>;

    /// Send the password-reset message.
    async fn send_password_reset(
        &self,
        email: &str,
        link: &str,
        first_name: &str,
    ) -> Result<SendConfirmation, MailerError>;
}
