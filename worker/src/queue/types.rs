//! Queue message types for the notification pipeline.
//!
//! This module defines:
//! - `NotificationPayload`: the JSON contract produced by account flows
//! - `NotificationKind`: the closed set of job types, decoded from the
//!   `messageTitle` field
//! - `ReceivedMessage`: the transport envelope handed to the consumer

use std::collections::HashMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Message attribute carrying the originating account identifier.
///
/// Set on every enqueued message; dispatch logic does not consult it.
pub const USER_ID_ATTRIBUTE: &str = "messageId";

/// Job type carried in the payload's `messageTitle` field.
///
/// Titles are matched case-insensitively on decode. Anything outside the
/// closed set becomes `Unknown` and is skipped (never deleted) by the
/// consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// Verify a freshly registered (or still unverified) email address.
    EmailVerification,
    /// Deliver a password-reset link.
    ResetPassword,
    /// A title the consumer does not handle.
    Unknown(String),
}

impl NotificationKind {
    /// Classify a wire title, ignoring case.
    pub fn parse(title: &str) -> Self {
        match title.to_lowercase().as_str() {
            "email verification" => Self::EmailVerification,
            "reset password" => Self::ResetPassword,
            _ => Self::Unknown(title.to_string()),
        }
    }

    /// Canonical wire string, as emitted by the account flows.
    pub fn as_wire_str(&self) -> &str {
        match self {
            Self::EmailVerification => "Email Verification",
            Self::ResetPassword => "reset password",
            Self::Unknown(title) => title,
        }
    }
}

impl Serialize for NotificationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire_str())
    }
}

impl<'de> Deserialize<'de> for NotificationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let title = String::deserialize(deserializer)?;
        Ok(Self::parse(&title))
    }
}

/// One outbound-email job, serialized as JSON on the wire.
///
/// Immutable once enqueued; the consumer only ever deletes messages, never
/// rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Job type, carried as `messageTitle` for wire compatibility.
    #[serde(rename = "messageTitle")]
    pub kind: NotificationKind,
    /// Recipient address.
    pub email: String,
    /// Used for template personalization.
    #[serde(rename = "firstName")]
    pub first_name: String,
    /// Action link embedding an identifier and a one-time secret.
    pub link: String,
    /// Opaque account reference; not re-validated by the consumer.
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl NotificationPayload {
    /// Payload for the registration and unverified-login flows.
    pub fn email_verification(
        email: impl Into<String>,
        first_name: impl Into<String>,
        link: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: NotificationKind::EmailVerification,
            email: email.into(),
            first_name: first_name.into(),
            link: link.into(),
            user_id: user_id.into(),
        }
    }

    /// Payload for the forgot-password flow.
    pub fn password_reset(
        email: impl Into<String>,
        first_name: impl Into<String>,
        link: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: NotificationKind::ResetPassword,
            email: email.into(),
            first_name: first_name.into(),
            link: link.into(),
            user_id: user_id.into(),
        }
    }
}

/// Transport envelope for one received delivery.
///
/// The receipt handle is only valid for the current visibility window and is
/// used exactly once, for deletion.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Queue-assigned message identifier, for logging.
    pub message_id: String,
    /// One-time token required to delete this delivery.
    pub receipt_handle: String,
    /// Serialized `NotificationPayload`.
    pub body: String,
    /// Side-channel string attributes set by the producer.
    pub attributes: HashMap<String, String>,
}
