//! Bounded retry with exponential backoff and jitter
//!
//! The persistence engine never retries; the sole consumer is the push
//! installation lookup, which retries a transient "endpoint not ready"
//! condition a bounded number of times.

use std::time::Duration;

use crate::error::{Error, Result};

/// Retry bounds
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum attempts, including the first
    pub max_attempts: u32,
    /// Backoff before the second attempt
    pub initial_backoff_ms: u64,
    /// Backoff ceiling
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 250,
            max_backoff_ms: 5000,
        }
    }
}

/// Retry a fallible async operation with exponential backoff
///
/// `is_retryable` decides whether an error is transient; anything else is
/// returned immediately.
pub async fn retry_with_backoff<T, F, Fut, R>(
    config: &RetryConfig,
    mut operation: F,
    is_retryable: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
    R: Fn(&Error) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= config.max_attempts || !is_retryable(&e) {
                    return Err(e);
                }

                let backoff = calculate_backoff(config, attempt);
                tracing::debug!(
                    attempt = attempt,
                    backoff_ms = backoff.as_millis(),
                    error = %e,
                    "Retrying after transient error"
                );

                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Calculate backoff duration with jitter
fn calculate_backoff(config: &RetryConfig, attempt: u32) -> Duration {
    let base_ms = config.initial_backoff_ms * (1u64 << (attempt - 1).min(10));
    let capped_ms = base_ms.min(config.max_backoff_ms);
    Duration::from_millis(capped_ms + rand_jitter(capped_ms))
}

/// Pseudo-random jitter without an external RNG dependency
fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % max.max(1)
}

/// Whether an error is the transient "endpoint not ready" condition
pub fn is_endpoint_not_ready(error: &Error) -> bool {
    match error {
        Error::Remote { status: 503, .. } => true,
        Error::Remote { code: Some(code), .. } => code == "PUSH_ENDPOINT_NOT_READY",
        _ => false,
    }
}
