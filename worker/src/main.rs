//! Courier worker - async SQS consumer for account email notifications.
//!
//! Long-polls the notification queue, sends verification and password-reset
//! emails through an SMTP relay, and deletes a message only after the relay
//! accepts the send. Everything else redelivers after the visibility timeout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier::{Config, Poller, SmtpMailer, SqsQueue};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    tracing::info!("worker_starting");

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        queue_url_set = !config.queue_url.is_empty(),
        max_messages = config.max_messages,
        wait_time_secs = config.wait_time_secs,
        visibility_timeout_secs = config.visibility_timeout_secs,
        poll_interval_secs = config.poll_interval_secs,
        smtp_host = %config.smtp.host,
        "config_loaded"
    );

    // One transport and one mailer, shared by reference from here on
    let queue = Arc::new(SqsQueue::from_env(config.queue_url.clone()).await);
    let mailer =
        Arc::new(SmtpMailer::new(&config.smtp).context("Failed to build SMTP mailer")?);

    let poller = Poller::new(queue, mailer, config.receive_options())
        .poll_interval(Duration::from_secs(config.poll_interval_secs));

    // Flip the watch on SIGINT/SIGTERM; the poller drains the current cycle
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    poller.run(shutdown_rx).await;

    tracing::info!("worker_shutdown_complete");
    Ok(())
}

/// Resolve when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
