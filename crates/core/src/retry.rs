//! Bounded polling used by the stability and lock waits.

use std::future::Future;
use std::time::Duration;

/// Fixed-interval retry policy: at most `max_attempts` probes, `delay` apart.
///
/// A run blocks for at most `max_attempts × delay` per wait. Tests inject
/// [`RetryPolicy::immediate`] to skip real sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A policy that never sleeps.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Upper bound on the time [`poll`](Self::poll) can block.
    pub fn ceiling(&self) -> Duration {
        self.delay.saturating_mul(self.max_attempts)
    }

    /// Runs `probe` until it yields a value, gives up, or attempts run out.
    ///
    /// `Ok(Some(v))` stops with success, `Ok(None)` sleeps and retries,
    /// `Err(e)` aborts immediately. Exhaustion returns `Ok(None)`.
    pub async fn poll<T, E, F, Fut>(&self, mut probe: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        for _ in 0..self.max_attempts {
            if let Some(value) = probe().await? {
                return Ok(Some(value));
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        Ok(None)
    }
}
