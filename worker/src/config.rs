//! Configuration module for environment variable parsing.
//!
//! Queue and SMTP settings come from environment variables. Tuning values
//! fall back to defaults when missing or unparsable; the queue URL and SMTP
//! credentials are required and fail startup with context when absent.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::warn;

use crate::mailer::SmtpConfig;
use crate::queue::ReceiveOptions;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the notification queue
    pub queue_url: String,

    /// Maximum messages returned by one receive call
    pub max_messages: i32,

    /// Long-poll wait in seconds before an empty receive returns
    pub wait_time_secs: i32,

    /// Seconds a received message stays hidden from other receivers
    pub visibility_timeout_secs: i32,

    /// Pause in seconds between poll cycles; zero polls continuously
    pub poll_interval_secs: u64,

    /// SMTP relay settings for outbound email
    pub smtp: SmtpConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let queue_url = env::var("AWS_QUEUE_URL").context("AWS_QUEUE_URL must be set")?;

        let username = env::var("SMTP_USERNAME").context("SMTP_USERNAME must be set")?;

        let smtp = SmtpConfig {
            host: env::var("SMTP_HOST").context("SMTP_HOST must be set")?,
            port: parse_var("SMTP_PORT", 587),
            password: env::var("SMTP_PASSWORD").context("SMTP_PASSWORD must be set")?,
            from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Courier".to_string()),
            // The relay login doubles as the sender address unless overridden.
            from_address: env::var("SMTP_FROM_ADDRESS").unwrap_or_else(|_| username.clone()),
            username,
        };

        Ok(Config {
            queue_url,

            max_messages: parse_var("QUEUE_MAX_MESSAGES", 10),

            wait_time_secs: parse_var("QUEUE_WAIT_TIME_SECS", 20),

            visibility_timeout_secs: parse_var("QUEUE_VISIBILITY_TIMEOUT_SECS", 30),

            poll_interval_secs: parse_var("POLL_INTERVAL_SECS", 0),

            smtp,
        })
    }

    /// Receive tuning for the poller, taken from the loaded values.
    pub fn receive_options(&self) -> ReceiveOptions {
        ReceiveOptions {
            max_messages: self.max_messages,
            wait_time_secs: self.wait_time_secs,
            visibility_timeout_secs: self.visibility_timeout_secs,
        }
    }
}

/// Parse an environment variable, falling back to the default when the
/// variable is missing or does not parse.
fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}
