//! # Retry Policy
//!
//! Reusable wrapper that repeats a fallible async operation.
//!
//! ```text
//! attempt 1 ──✗──► wait ──► attempt 2 ──✗──► wait ──► attempt 3 ──✗──► RetriesExhausted
//!                   │                           │
//!                   └── fixed: 5s, 5s ──────────┘
//!                   └── exponential: 5s, 10s ───┘
//! ```
//!
//! Only errors with [`SyncError::is_retryable`] are repeated. Anything else
//! returns immediately.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use backoff::ExponentialBackoffBuilder;
use tracing::warn;

use crate::config::{RetrySettings, RetryStrategy};
use crate::error::{SyncError, SyncResult};

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    strategy: RetryStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// Fixed delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay,
            strategy: RetryStrategy::Fixed,
        }
    }

    /// Delay starting at `initial` and doubling each time.
    pub fn exponential(max_attempts: u32, initial: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay: initial,
            strategy: RetryStrategy::Exponential,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        match settings.strategy {
            RetryStrategy::Fixed => Self::fixed(settings.max_attempts, settings.delay()),
            RetryStrategy::Exponential => {
                Self::exponential(settings.max_attempts, settings.delay())
            }
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Creates the delay schedule for one `run`.
    fn schedule(&self) -> Box<dyn Backoff + Send> {
        match self.strategy {
            RetryStrategy::Fixed => Box::new(Constant::new(self.delay)),
            RetryStrategy::Exponential => Box::new(
                ExponentialBackoffBuilder::new()
                    .with_initial_interval(self.delay)
                    .with_randomization_factor(0.0)
                    .with_multiplier(2.0)
                    .with_max_interval(self.delay * 16)
                    .with_max_elapsed_time(None)
                    .build(),
            ),
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the
    /// attempts run out.
    ///
    /// `label` names the operation in logs and in
    /// [`SyncError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let mut schedule = self.schedule();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            let delay = match schedule.next_backoff() {
                Some(delay) if attempt < self.max_attempts => delay,
                _ => {
                    return Err(SyncError::RetriesExhausted {
                        operation: label.to_string(),
                        attempts: attempt,
                        last_error: err.to_string(),
                    })
                }
            };

            warn!(
                operation = label,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Upstream request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
