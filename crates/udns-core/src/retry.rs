//! Bounded retry for transient remote failures
//!
//! Only server-side failures (status >= 500) are retried, with a fixed pause
//! between attempts. Everything else is returned to the caller as-is.

use crate::context::Context;
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of attempts per call (first try included)
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Default pause between attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Fixed-interval retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    interval: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one attempt
    pub fn new(max_attempts: usize, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `op`, retrying transient failures
    ///
    /// The context is checked before every attempt, so a cancelled context
    /// never issues a call. The last error is returned once attempts run out.
    pub async fn run<T, F, Fut>(&self, ctx: &Context, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            ctx.check()?;

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        "Transient remote failure, retrying in {:?}: {}",
                        self.interval,
                        e
                    );
                    ctx.sleep(self.interval).await?;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL)
    }
}
