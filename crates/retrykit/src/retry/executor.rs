//! The retry loop and backoff computation.

use super::strategy::BackoffStrategy;
use crate::classify::RetryableError;
use crate::policy::{RetryOverrides, RetryPolicy};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Run `operation` under the defaults merged with `overrides`.
///
/// The merge happens once, before the first attempt. On success the value
/// is returned immediately. On a fatal error, or once the retry budget is
/// spent, the error from the last attempt is returned unchanged.
///
/// The operation may run up to `max_retries + 1` times, so it should be safe
/// to repeat. Nothing here deduplicates side effects.
///
/// # Examples
///
/// ```rust
/// use retrykit::classify::OperationError;
/// use retrykit::policy::RetryOverrides;
/// use retrykit::retry::execute;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), OperationError> {
/// let calls = AtomicU32::new(0);
/// let overrides = RetryOverrides::default()
///     .with_max_retries(2)
///     .with_initial_delay(Duration::from_millis(10))
///     .with_retryable_status_codes([503]);
///
/// let value = execute(|| {
///     let calls = &calls;
///     async move {
///         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///             Err(OperationError::new("unavailable").with_status(503))
///         } else {
///             Ok("ok")
///         }
///     }
/// }, overrides).await?;
///
/// assert_eq!(value, "ok");
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # Ok(())
/// # }
/// ```
pub async fn execute<F, Fut, T, E>(operation: F, overrides: RetryOverrides) -> Result<T, E>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: RetryableError + Send + Sync + 'static,
{
    RetryPolicy::from_overrides(&overrides)
        .execute(operation)
        .await
}

/// Delay before retry number `retry` (0-indexed):
/// `min(initial * factor^retry, max)`.
///
/// ```rust
/// use retrykit::retry::backoff_delay;
/// use std::time::Duration;
///
/// let initial = Duration::from_millis(300);
/// let max = Duration::from_secs(5);
/// assert_eq!(backoff_delay(initial, 2.0, max, 0), Duration::from_millis(300));
/// assert_eq!(backoff_delay(initial, 2.0, max, 2), Duration::from_millis(1200));
/// assert_eq!(backoff_delay(initial, 2.0, max, 10), max);
/// ```
pub fn backoff_delay(initial: Duration, factor: f64, max: Duration, retry: u32) -> Duration {
    let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
    let base = initial.as_nanos() as f64 * factor.powi(exponent);
    clamp_nanos(base, max)
}

// Works in nanoseconds so whole-millisecond inputs stay exact.
fn clamp_nanos(nanos: f64, max: Duration) -> Duration {
    let capped = nanos.min(max.as_nanos() as f64).max(0.0);
    Duration::from_nanos(capped.round() as u64)
}

#[async_trait]
impl BackoffStrategy for RetryPolicy {
    async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: RetryableError + Send + Sync + 'static,
    {
        let mut attempt = 0;
        loop {
            let err = match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };

            let verdict = self.classify(&err);
            if !verdict.is_retryable() {
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, error = %err, "non-retryable error, giving up");
                return Err(err);
            }
            if attempt >= self.max_retries {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    attempts = attempt + 1,
                    reason = verdict.as_str(),
                    error = %err,
                    "retry budget exhausted"
                );
                return Err(err);
            }

            let delay = self.next_delay(attempt).unwrap_or(Duration::ZERO);
            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                reason = verdict.as_str(),
                error = %err,
                "retryable error, backing off"
            );
            tokio::time::sleep(delay).await;

            attempt += 1;
            if let Some(on_retry) = &self.on_retry {
                on_retry(&err, attempt);
            }
        }
    }

    fn should_retry(&self, error: &dyn RetryableError, _attempt: u32) -> bool {
        self.classify(error).is_retryable()
    }

    fn next_delay(&self, retry: u32) -> Option<Duration> {
        let base = backoff_delay(self.initial_delay, self.backoff_factor, self.max_delay, retry);
        if self.jitter <= 0.0 {
            return Some(base);
        }

        // base * jitter * random(-1.0, +1.0), then re-capped
        let base = base.as_nanos() as f64;
        let jitter_amount = base * self.jitter * (rand::random::<f64>() - 0.5) * 2.0;
        Some(clamp_nanos(base + jitter_amount, self.max_delay))
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
