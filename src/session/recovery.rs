//! Retry policy for channel re-acquisition
//!
//! The transport can drop a channel at any time. By default the session
//! stays unregistered until the caller registers again; a configured
//! `RetryConfig` makes the event router re-acquire the channel with
//! exponential backoff instead.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::transport::TransportError;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Initial delay between attempts
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub use_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Configuration for quick retries over a transient glitch
    pub fn quick() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 1.5,
            use_jitter: true,
        }
    }

    /// Configuration for patient retries while the radio settles
    pub fn slow() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 3.0,
            use_jitter: false,
        }
    }
}

/// Retry an operation with exponential backoff until it succeeds or the
/// attempt budget is exhausted
pub async fn retry_with_backoff<T, F, Fut>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;
        debug!(
            operation = operation_name,
            attempt,
            max_attempts = config.max_attempts,
            "attempting operation"
        );

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt, "operation succeeded after retries"
                    );
                }
                return Ok(result);
            }
            Err(e) if attempt < config.max_attempts => {
                warn!(
                    operation = operation_name,
                    attempt,
                    error = %e,
                    next_delay_ms = delay.as_millis() as u64,
                    "attempt failed, will retry"
                );

                let actual_delay = if config.use_jitter {
                    let jitter = (rand::random::<f64>() - 0.5) * 0.2;
                    let millis = delay.as_millis() as f64;
                    Duration::from_millis((millis * (1.0 + jitter)) as u64)
                } else {
                    delay
                };
                sleep(actual_delay).await;

                let next_delay_ms = (delay.as_millis() as f64 * config.backoff_multiplier) as u64;
                delay = Duration::from_millis(next_delay_ms).min(config.max_delay);
            }
            Err(e) => {
                warn!(
                    operation = operation_name,
                    attempts = attempt,
                    error = %e,
                    "operation failed after all attempts"
                );
                return Err(e);
            }
        }
    }
}
