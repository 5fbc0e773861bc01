//! Recording dispatcher used in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{EmailDispatcher, MailerError, SendConfirmation};

/// Which dispatcher operation was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentKind {
    Verification,
    PasswordReset,
}

/// A send captured by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub kind: SentKind,
    pub email: String,
    pub link: String,
    pub first_name: String,
}

/// Dispatcher double that captures sends instead of delivering them.
pub struct MockMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    should_fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    /// A mock whose sends always fail.
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            should_fail: true,
        }
    }

    /// All sends captured so far.
    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn was_sent_to(&self, email: &str) -> bool {
        self.sent.lock().await.iter().any(|s| s.email == email)
    }

    async fn record(
        &self,
        kind: SentKind,
        email: &str,
        link: &str,
        first_name: &str,
    ) -> Result<SendConfirmation, MailerError> {
        if self.should_fail {
            return Err(MailerError::Rejected("mock dispatcher failure".to_string()));
        }

        self.sent.lock().await.push(SentEmail {
            kind,
            email: email.to_string(),
            link: link.to_string(),
            first_name: first_name.to_string(),
        });

        Ok(SendConfirmation {
            response: "250 Ok".to_string(),
        })
    }
}

impl Default for MockMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailDispatcher for MockMailer {
    async fn send_verification(
        &self,
        email: &str,
        link: &str,
        first_name: &str,
    ) -> Result<SendConfirmation, MailerError> {
        self.record(SentKind::Verification, email, link, first_name)
            .await
    }

    async fn send_password_reset(
        &self,
        email: &str,
        link: &str,
        first_name: &str,
    ) -> Result<SendConfirmation, MailerError> {
        self.record(SentKind::PasswordReset, email, link, first_name)
            .await
    }
}
