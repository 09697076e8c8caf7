//! Retry policy and exponential backoff for upstream calls
//!
//! The decision "retry or give up" is a pure function of [`ErrorKind`]; the loop
//! itself only counts attempts and sleeps.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{ErrorKind, Result, UpstreamError};

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Sleep and try again while attempts remain
    Retry,
    /// Surface the error immediately
    FailFast,
}

/// Map an error classification onto a retry decision
pub fn policy_for(kind: ErrorKind) -> RetryPolicy {
    match kind {
        ErrorKind::UpstreamService => RetryPolicy::Retry,
        ErrorKind::InvalidInput
        | ErrorKind::ResourceNotFound
        | ErrorKind::PermissionDenied
        | ErrorKind::Configuration
        | ErrorKind::ExtractionFailure => RetryPolicy::FailFast,
    }
}

/// Backoff configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Config with the given attempt cap and default delays
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay before retrying after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let raw_ms = self.base_delay.as_millis() as f64 * self.exponential_base.powi(exponent);
        let capped_ms = raw_ms.min(self.max_delay.as_millis() as f64);

        let delay_ms = if self.jitter {
            capped_ms * rand::rng().random_range(0.5..1.5)
        } else {
            capped_ms
        };

        Duration::from_millis(delay_ms as u64)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the attempt cap is hit
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if policy_for(err.kind()) == RetryPolicy::FailFast {
                    return Err(err);
                }
                if attempt >= max_attempts {
                    return Err(UpstreamError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    }
                    .into());
                }

                let delay = config.delay_for(attempt);
                tracing::warn!(
                    "{} failed on attempt {}/{}: {} (retrying in {:?})",
                    operation,
                    attempt,
                    max_attempts,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
