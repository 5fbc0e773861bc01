//! Courier - asynchronous account-notification pipeline.
//!
//! This library provides the shared modules for the courier worker:
//! - `queue`: payload contract, transport trait, SQS and in-memory clients
//! - `mailer`: email dispatcher trait, SMTP implementation, recording mock
//! - `consumer`: the long-poll, dispatch, acknowledge loop
//! - `config`: environment configuration
//!
//! ## Architecture
//!
//! ```text
//! Account flows → Publisher → notification queue → Poller → SMTP relay
//! ```

pub mod config;
pub mod consumer;
pub mod mailer;
pub mod queue;

// Re-export commonly used types
pub use config::Config;
pub use consumer::{MessageOutcome, Poller, SkipReason};
pub use mailer::{EmailDispatcher, MailerError, SmtpConfig, SmtpMailer};
pub use queue::{
    NotificationKind, NotificationPayload, Publisher, QueueError, QueueTransport, ReceiveOptions,
    SqsQueue,
};
