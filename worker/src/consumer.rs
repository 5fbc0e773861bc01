//! Notification queue poller.
//!
//! This module handles the receive/dispatch/acknowledge loop: long-poll the
//! queue for a batch, spawn one task per message, join them all before the
//! next receive, and delete a message only after the dispatcher confirms the
//! send. Failed and unrecognized messages are left untouched so the queue
//! redelivers them after the visibility timeout.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::mailer::EmailDispatcher;
use crate::queue::types::{NotificationKind, NotificationPayload, ReceivedMessage};
use crate::queue::{QueueError, QueueTransport, ReceiveOptions};

/// Why a message was left on the queue without a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Body did not decode as a notification payload.
    Malformed,
    /// Payload decoded, but its title is not one this worker handles.
    Unrecognized,
}

/// Terminal state of one received message within a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The dispatcher accepted the send. `acknowledged` is false when the
    /// delete afterwards failed; the message will redeliver and the
    /// duplicate send is an accepted cost.
    Delivered { acknowledged: bool },
    /// No dispatch attempt; the message stays for redelivery or operator
    /// inspection.
    Skipped { reason: SkipReason },
    /// The dispatcher failed; the message redelivers after the visibility
    /// timeout.
    Failed,
}

/// The consumer side of the notification pipeline.
///
/// Holds the injected queue transport and email dispatcher. Nothing polls
/// until [`Poller::run`] is called explicitly.
pub struct Poller {
    queue: Arc<dyn QueueTransport>,
    mailer: Arc<dyn EmailDispatcher>,
    options: ReceiveOptions,
    poll_interval: Duration,
}

impl Poller {
    pub fn new(
        queue: Arc<dyn QueueTransport>,
        mailer: Arc<dyn EmailDispatcher>,
        options: ReceiveOptions,
    ) -> Self {
        Self {
            queue,
            mailer,
            options,
            poll_interval: Duration::ZERO,
        }
    }

    /// Pause between poll cycles. Zero (the default) means continuous
    /// long-polling; the receive call itself already waits up to
    /// `wait_time_secs` when the queue is empty.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run one poll cycle: receive a batch, process every message in its own
    /// task, and wait for all of them to settle.
    ///
    /// Returns one outcome per received message, in batch order. Transport
    /// errors from the receive call are the only error path; everything
    /// per-message degrades to an outcome instead.
    pub async fn poll_once(&self) -> Result<Vec<MessageOutcome>, QueueError> {
        let batch = self.queue.receive_batch(&self.options).await?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        info!(count = batch.len(), "notification_batch_received");

        let handles: Vec<_> = batch
            .into_iter()
            .map(|message| {
                let queue = Arc::clone(&self.queue);
                let mailer = Arc::clone(&self.mailer);
                tokio::spawn(handle_message(queue, mailer, message))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    // A panicked task must not take its siblings down; its
                    // message stays on the queue and redelivers.
                    error!(error = %e, "notification_task_panicked");
                    outcomes.push(MessageOutcome::Failed);
                }
            }
        }

        Ok(outcomes)
    }

    /// Poll until the shutdown signal flips to `true`.
    ///
    /// Receive errors are logged and the loop continues with the next cycle;
    /// nothing here is fatal to the process. A cycle interrupted by shutdown
    /// leaves not-yet-deleted messages exactly as received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            max_messages = self.options.max_messages,
            wait_time_secs = self.options.wait_time_secs,
            visibility_timeout_secs = self.options.visibility_timeout_secs,
            poll_interval_secs = self.poll_interval.as_secs(),
            "poller_started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown.changed() => {
                    info!("poller_stopping");
                    break;
                }
                result = self.poll_once() => match result {
                    Ok(outcomes) if !outcomes.is_empty() => {
                        let delivered = outcomes
                            .iter()
                            .filter(|o| matches!(o, MessageOutcome::Delivered { .. }))
                            .count();
                        info!(
                            total = outcomes.len(),
                            delivered = delivered,
                            "notification_cycle_complete"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "notification_receive_failed");
                    }
                }
            }

            if !self.poll_interval.is_zero() {
                tokio::select! {
                    _ = shutdown.changed() => {
                        info!("poller_stopping");
                        break;
                    }
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }

        info!("poller_stopped");
    }
}

/// Process a single received message through to its outcome.
async fn handle_message(
    queue: Arc<dyn QueueTransport>,
    mailer: Arc<dyn EmailDispatcher>,
    message: ReceivedMessage,
) -> MessageOutcome {
    let payload: NotificationPayload = match serde_json::from_str(&message.body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(
                message_id = %message.message_id,
                error = %e,
                "notification_body_malformed"
            );
            return MessageOutcome::Skipped {
                reason: SkipReason::Malformed,
            };
        }
    };

    let sent = match &payload.kind {
        NotificationKind::EmailVerification => {
            mailer
                .send_verification(&payload.email, &payload.link, &payload.first_name)
                .await
        }
        NotificationKind::ResetPassword => {
            mailer
                .send_password_reset(&payload.email, &payload.link, &payload.first_name)
                .await
        }
        NotificationKind::Unknown(title) => {
            warn!(
                message_id = %message.message_id,
                title = %title,
                "notification_title_unrecognized"
            );
            return MessageOutcome::Skipped {
                reason: SkipReason::Unrecognized,
            };
        }
    };

    match sent {
        Ok(confirmation) => {
            info!(
                message_id = %message.message_id,
                kind = payload.kind.as_wire_str(),
                response = %confirmation.response,
                "notification_dispatched"
            );

            match queue.delete_message(&message.receipt_handle).await {
                Ok(()) => MessageOutcome::Delivered { acknowledged: true },
                Err(e) => {
                    // The email already went out. The queue will hand this
                    // delivery back after the visibility timeout.
                    warn!(
                        message_id = %message.message_id,
                        error = %e,
                        "notification_ack_failed"
                    );
                    MessageOutcome::Delivered {
                        acknowledged: false,
                    }
                }
            }
        }
        Err(e) => {
            error!(
                message_id = %message.message_id,
                kind = payload.kind.as_wire_str(),
                error = %e,
                "notification_dispatch_failed"
            );
            MessageOutcome::Failed
        }
    }
}
