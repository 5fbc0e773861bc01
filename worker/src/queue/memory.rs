//! In-memory queue transport with visibility-timeout semantics.
//!
//! Stands in for SQS in tests and local development. Redelivery after the
//! visibility timeout, receipt-handle rotation on each delivery, and
//! delete-after-expiry failures all behave like the managed service, so
//! consumer behavior can be exercised hermetically.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use super::types::{NotificationPayload, ReceivedMessage, USER_ID_ATTRIBUTE};
use super::{QueueError, QueueTransport, ReceiveOptions};

/// Granularity of the simulated long poll.
const POLL_STEP: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    attributes: HashMap<String, String>,
    /// Hidden from receivers until this instant.
    visible_at: Instant,
    /// Handle issued by the most recent delivery, if any.
    receipt_handle: Option<String>,
}

#[derive(Default)]
struct Inner {
    messages: Vec<StoredMessage>,
    next_message_id: u64,
    next_receipt: u64,
}

/// Queue held entirely in process memory.
pub struct InMemoryQueue {
    inner: Mutex<Inner>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Enqueue a raw body, bypassing payload serialization.
    pub fn push_body(&self, body: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        let message_id = format!("mem-{}", inner.next_message_id);
        inner.next_message_id += 1;
        inner.messages.push(StoredMessage {
            message_id,
            body: body.into(),
            attributes: HashMap::new(),
            visible_at: Instant::now(),
            receipt_handle: None,
        });
    }

    /// Number of messages still held, visible or not.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn claim_visible(&self, options: &ReceiveOptions) -> Vec<ReceivedMessage> {
        let mut inner = self.inner.lock().unwrap();
        let Inner {
            messages,
            next_receipt,
            ..
        } = &mut *inner;

        let now = Instant::now();
        let visibility = Duration::from_secs(options.visibility_timeout_secs as u64);
        let mut batch = Vec::new();

        for message in messages.iter_mut() {
            if batch.len() >= options.max_messages as usize {
                break;
            }
            if message.visible_at > now {
                continue;
            }

            // A redelivery invalidates the previous handle.
            let handle = format!("rcpt-{}-{}", message.message_id, *next_receipt);
            *next_receipt += 1;
            message.receipt_handle = Some(handle.clone());
            message.visible_at = now + visibility;

            batch.push(ReceivedMessage {
                message_id: message.message_id.clone(),
                receipt_handle: handle,
                body: message.body.clone(),
                attributes: message.attributes.clone(),
            });
        }

        batch
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueue {
    async fn send(&self, payload: &NotificationPayload) -> Result<String, QueueError> {
        let body = serde_json::to_string(payload)?;

        let mut inner = self.inner.lock().unwrap();
        let message_id = format!("mem-{}", inner.next_message_id);
        inner.next_message_id += 1;
        inner.messages.push(StoredMessage {
            message_id: message_id.clone(),
            body,
            attributes: HashMap::from([(USER_ID_ATTRIBUTE.to_string(), payload.user_id.clone())]),
            visible_at: Instant::now(),
            receipt_handle: None,
        });

        Ok(message_id)
    }

    async fn receive_batch(
        &self,
        options: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let deadline = Instant::now() + Duration::from_secs(options.wait_time_secs as u64);

        loop {
            let batch = self.claim_visible(options);
            if !batch.is_empty() || Instant::now() >= deadline {
                return Ok(batch);
            }
            sleep(POLL_STEP).await;
        }
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();

        // The handle is only honored while its delivery is still invisible.
        let position = inner.messages.iter().position(|message| {
            message.receipt_handle.as_deref() == Some(receipt_handle) && message.visible_at > now
        });

        match position {
            Some(index) => {
                inner.messages.remove(index);
                Ok(())
            }
            None => Err(QueueError::Delete(format!(
                "receipt handle {receipt_handle} expired or already deleted"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> NotificationPayload {
        NotificationPayload::email_verification("a@b.com", "Ana", "https://x/v", "1")
    }

    fn options(wait: i32, visibility: i32) -> ReceiveOptions {
        ReceiveOptions {
            max_messages: 10,
            wait_time_secs: wait,
            visibility_timeout_secs: visibility,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_hides_message_until_timeout() {
        let queue = InMemoryQueue::new();
        queue.send(&payload()).await.unwrap();

        let first = queue.receive_batch(&options(1, 5)).await.unwrap();
        assert_eq!(first.len(), 1);

        // Still invisible, so the long poll comes back empty.
        let second = queue.receive_batch(&options(1, 5)).await.unwrap();
        assert!(second.is_empty());

        sleep(Duration::from_secs(6)).await;

        let third = queue.receive_batch(&options(1, 5)).await.unwrap();
        assert_eq!(third.len(), 1);
        assert_ne!(third[0].receipt_handle, first[0].receipt_handle);
        assert_eq!(third[0].body, first[0].body);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_with_live_handle_removes_message() {
        let queue = InMemoryQueue::new();
        queue.send(&payload()).await.unwrap();

        let batch = queue.receive_batch(&options(1, 30)).await.unwrap();
        queue.delete_message(&batch[0].receipt_handle).await.unwrap();

        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_with_expired_handle_fails() {
        let queue = InMemoryQueue::new();
        queue.send(&payload()).await.unwrap();

        let batch = queue.receive_batch(&options(1, 2)).await.unwrap();
        sleep(Duration::from_secs(3)).await;

        let result = queue.delete_message(&batch[0].receipt_handle).await;

        assert!(matches!(result, Err(QueueError::Delete(_))));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_handle_fails_after_redelivery() {
        let queue = InMemoryQueue::new();
        queue.send(&payload()).await.unwrap();

        let first = queue.receive_batch(&options(1, 2)).await.unwrap();
        sleep(Duration::from_secs(3)).await;
        let second = queue.receive_batch(&options(1, 30)).await.unwrap();

        // The original handle was superseded by the redelivery.
        let stale = queue.delete_message(&first[0].receipt_handle).await;
        assert!(stale.is_err());

        queue
            .delete_message(&second[0].receipt_handle)
            .await
            .unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_queue_long_poll_returns_empty() {
        let queue = InMemoryQueue::new();

        let batch = queue.receive_batch(&options(2, 30)).await.unwrap();

        assert!(batch.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_respects_max_messages() {
        let queue = InMemoryQueue::new();
        for _ in 0..5 {
            queue.send(&payload()).await.unwrap();
        }

        let batch = queue
            .receive_batch(&ReceiveOptions {
                max_messages: 3,
                wait_time_secs: 1,
                visibility_timeout_secs: 30,
            })
            .await
            .unwrap();

        assert_eq!(batch.len(), 3);
    }
}
