#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Policy-driven retry with exponential backoff for fallible async operations.
//!
//! This crate wraps any asynchronous operation that may fail and re-runs it
//! while its errors are classified as transient:
//!
//! - **Retry executor** via [`retry::execute`] and the `BackoffStrategy` trait
//!   - Exponential backoff capped at a maximum delay
//!   - Optional jitter
//!   - An observer hook called before each retry
//! - **Retryable wrapper** via [`retry::make_retryable`]
//! - **Error classification** via the [`classify::RetryableError`] trait
//! - **Configuration** via [`policy::RetryOverrides`], from code, environment
//!   variables, or TOML/JSON
//!
//! An error is transient when its named kind or status code is listed in the
//! policy, or when it reports a reset or timed-out connection. Anything else
//! ends the call on the first occurrence. Whatever the outcome, the caller
//! receives the operation's own error value, never a wrapper.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use retrykit::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::builder()
//!     .max_retries(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .on_retry(|err, attempt| eprintln!("retrying attempt {attempt} after: {err}"))
//!     .build();
//!
//! let result = policy.execute(|| async {
//!     Ok::<_, OperationError>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `tracing` (default): emit `tracing` events when backing off or giving up
//! - `reqwest`: classify `reqwest::Error` by status, timeout and connect failure

pub mod classify;
pub mod error;
#[cfg(feature = "reqwest")]
pub mod http;
pub mod policy;
pub mod retry;

pub use error::{PolicyError, Result};

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use retrykit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::classify::{Classification, OperationError, RetryableError};
    pub use crate::policy::{OnRetry, RetryOverrides, RetryPolicy, RetryPolicyBuilder};
    pub use crate::retry::{BackoffStrategy, Retryable, execute, make_retryable};
}
