//! Producer side of the notification pipeline.
//!
//! Account flows (registration, unverified login, forgot password) build a
//! payload and enqueue it here. Delivery to the recipient happens
//! asynchronously; the caller only learns whether the enqueue itself was
//! accepted.

use std::sync::Arc;

use tracing::info;

use super::types::NotificationPayload;
use super::{QueueError, QueueTransport};

/// Producer handle over the shared queue transport.
#[derive(Clone)]
pub struct Publisher {
    queue: Arc<dyn QueueTransport>,
}

impl Publisher {
    pub fn new(queue: Arc<dyn QueueTransport>) -> Self {
        Self { queue }
    }

    /// Enqueue one notification job.
    ///
    /// Errors are returned to the caller, which treats the side channel as
    /// best-effort: a failed enqueue must not fail the account operation
    /// that triggered it.
    pub async fn enqueue(&self, payload: &NotificationPayload) -> Result<(), QueueError> {
        let message_id = self.queue.send(payload).await?;

        info!(
            message_id = %message_id,
            kind = payload.kind.as_wire_str(),
            user_id = %payload.user_id,
            "notification_enqueued"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::memory::InMemoryQueue;
    use crate::queue::types::USER_ID_ATTRIBUTE;
    use crate::queue::ReceiveOptions;

    #[tokio::test(start_paused = true)]
    async fn test_enqueued_payload_round_trips_through_receive() {
        let queue = Arc::new(InMemoryQueue::new());
        let publisher = Publisher::new(queue.clone());

        let payload = NotificationPayload::email_verification(
            "a@b.com",
            "Ana",
            "https://x/?userId=1&token=abc",
            "1",
        );
        publisher.enqueue(&payload).await.unwrap();

        let options = ReceiveOptions {
            wait_time_secs: 1,
            ..Default::default()
        };
        let batch = queue.receive_batch(&options).await.unwrap();

        assert_eq!(batch.len(), 1);
        let decoded: NotificationPayload = serde_json::from_str(&batch[0].body).unwrap();
        assert_eq!(decoded, payload);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_sets_account_identifier_attribute() {
        let queue = Arc::new(InMemoryQueue::new());
        let publisher = Publisher::new(queue.clone());

        let payload = NotificationPayload::password_reset("u@v.com", "Cleo", "https://x/r", "9");
        publisher.enqueue(&payload).await.unwrap();

        let options = ReceiveOptions {
            wait_time_secs: 1,
            ..Default::default()
        };
        let batch = queue.receive_batch(&options).await.unwrap();

        assert_eq!(
            batch[0].attributes.get(USER_ID_ATTRIBUTE),
            Some(&"9".to_string())
        );
    }
}
