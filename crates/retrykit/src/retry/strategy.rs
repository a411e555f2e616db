//! The retry strategy trait.

use crate::classify::RetryableError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// A strategy for retrying failed operations with backoff.
///
/// Implementations determine when to retry, how long to wait between
/// attempts, and when to give up. [`RetryPolicy`](crate::policy::RetryPolicy)
/// is the standard implementation.
///
/// # Examples
///
/// ```rust
/// use retrykit::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let policy = RetryPolicy::builder()
///     .max_retries(3)
///     .initial_delay(Duration::from_millis(100))
///     .build();
///
/// let result = policy.execute(|| async {
///     // Your async operation here
///     Ok::<_, std::io::Error>(42)
/// }).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait BackoffStrategy: Send + Sync {
    /// Execute an operation with retry logic.
    ///
    /// The operation is called repeatedly until it succeeds, a non-retryable
    /// error occurs, or the maximum number of retries is exceeded. The error
    /// returned is always the one produced by the last attempt, unchanged.
    ///
    /// # Type Parameters
    /// - `F`: Function that returns a future, called once per attempt
    /// - `Fut`: The future returned by the function
    /// - `T`: Success type
    /// - `E`: Error type, inspected through [`RetryableError`]
    async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: RetryableError + Send + Sync + 'static;

    /// Determine if an error is retryable.
    ///
    /// Default implementation returns `true` for all errors.
    ///
    /// # Parameters
    /// - `error`: The error to evaluate
    /// - `attempt`: The index of the attempt that failed (0-indexed)
    fn should_retry(&self, error: &dyn RetryableError, attempt: u32) -> bool {
        let _ = (error, attempt);
        true
    }

    /// Calculate the delay before the next retry.
    ///
    /// `retry` counts retries already scheduled, so `next_delay(0)` is the
    /// wait between the initial attempt and the first retry.
    ///
    /// Returns `None` when no delay applies.
    fn next_delay(&self, retry: u32) -> Option<Duration>;

    /// Maximum number of retries after the initial attempt.
    ///
    /// If `max_retries() == 3`, the operation is attempted up to 4 times.
    fn max_retries(&self) -> u32;
}
