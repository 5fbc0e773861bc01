//! AWS SQS implementation of the queue transport.

use aws_config::BehaviorVersion;
use aws_sdk_sqs::types::MessageAttributeValue;
use aws_sdk_sqs::Client;

use async_trait::async_trait;
use tracing::{info, warn};

use super::types::{NotificationPayload, ReceivedMessage, USER_ID_ATTRIBUTE};
use super::{QueueError, QueueTransport, ReceiveOptions};

/// SQS-backed queue client.
///
/// Constructed once at startup and shared by the publisher and the poller.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    /// Wrap an existing SDK client.
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Build a client from the default AWS credential chain.
    pub async fn from_env(queue_url: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(Client::new(&config), queue_url)
    }
}

#[async_trait]
impl QueueTransport for SqsQueue {
    async fn send(&self, payload: &NotificationPayload) -> Result<String, QueueError> {
        let body = serde_json::to_string(payload)?;

        let attribute = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(&payload.user_id)
            .build()
            .map_err(|e| QueueError::Transport(e.to_string()))?;

        let response = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .message_attributes(USER_ID_ATTRIBUTE, attribute)
            .send()
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;

        let message_id = response.message_id().unwrap_or_default().to_string();

        info!(
            message_id = %message_id,
            kind = payload.kind.as_wire_str(),
            "sqs_message_sent"
        );

        Ok(message_id)
    }

    async fn receive_batch(
        &self,
        options: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .message_attribute_names("All")
            .max_number_of_messages(options.max_messages)
            .wait_time_seconds(options.wait_time_secs)
            .visibility_timeout(options.visibility_timeout_secs)
            .send()
            .await
            .map_err(|e| QueueError::Transport(e.to_string()))?;

        let messages = response.messages.unwrap_or_default();
        let mut received = Vec::with_capacity(messages.len());

        for message in messages {
            let message_id = message.message_id.unwrap_or_default();

            let (Some(receipt_handle), Some(body)) = (message.receipt_handle, message.body)
            else {
                warn!(message_id = %message_id, "sqs_message_missing_fields");
                continue;
            };

            let attributes = message
                .message_attributes
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(name, value)| value.string_value.map(|v| (name, v)))
                .collect();

            received.push(ReceivedMessage {
                message_id,
                receipt_handle,
                body,
                attributes,
            });
        }

        Ok(received)
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(e.to_string()))?;

        Ok(())
    }
}
