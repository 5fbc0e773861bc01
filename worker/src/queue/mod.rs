//! Queue module for the notification pipeline.
//!
//! This module provides:
//! - The payload contract and transport envelope
//! - The `QueueTransport` trait the publisher and poller are built against
//! - An SQS implementation and an in-memory implementation with the same
//!   visibility-timeout semantics
//!
//! ## Architecture
//!
//! ```text
//! Account flows → Publisher → notification queue → Poller → SMTP relay
//! ```

pub mod memory;
pub mod publisher;
pub mod sqs;
pub mod types;

pub use memory::InMemoryQueue;
pub use publisher::Publisher;
pub use sqs::SqsQueue;
pub use types::{NotificationKind, NotificationPayload, ReceivedMessage, USER_ID_ATTRIBUTE};

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by queue transports.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Queue service unreachable or the request was rejected.
    #[error("queue transport error: {0}")]
    Transport(String),
    /// Payload could not be encoded for the wire.
    #[error("failed to serialize notification payload: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Receipt handle expired or the message was already deleted.
    #[error("failed to delete message: {0}")]
    Delete(String),
}

/// Tuning for a single receive call.
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    /// Upper bound on messages returned by one receive.
    pub max_messages: i32,
    /// Long-poll wait before returning an empty batch.
    pub wait_time_secs: i32,
    /// How long received messages stay hidden from other receivers.
    pub visibility_timeout_secs: i32,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time_secs: 20,
            visibility_timeout_secs: 30,
        }
    }
}

/// Transport contract against the notification queue.
///
/// Implementations are constructed once at startup and injected into the
/// publisher and the poller, so tests can substitute a double.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Serialize a payload and submit it, attaching the account-identifier
    /// attribute. Returns the queue-assigned message id.
    async fn send(&self, payload: &NotificationPayload) -> Result<String, QueueError>;

    /// Long-poll for a batch. Blocks up to `wait_time_secs` for at least one
    /// message; an empty vec means the wait elapsed, never an error.
    async fn receive_batch(
        &self,
        options: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Permanently remove a delivery. Fails with `QueueError::Delete` when
    /// the handle has expired or the message is already gone; callers treat
    /// that as non-fatal.
    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError>;
}
