//! Retry execution and the retryable wrapper.
//!
//! # Key Types
//!
//! - [`BackoffStrategy`] - Core trait for retry strategies
//! - [`execute`] - Run an operation under a policy merged from overrides
//! - [`Retryable`] - A function with a retry policy bound to it
//!
//! # Examples
//!
//! ```rust
//! use retrykit::policy::RetryOverrides;
//! use retrykit::retry::execute;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let overrides = RetryOverrides::default()
//!     .with_max_retries(3)
//!     .with_initial_delay(Duration::from_millis(100));
//!
//! let result = execute(|| async {
//!     // Your operation here
//!     Ok::<_, std::io::Error>(42)
//! }, overrides).await?;
//! # Ok(())
//! # }
//! ```

mod executor;
mod strategy;
mod wrapper;

pub use executor::{backoff_delay, execute};
pub use strategy::BackoffStrategy;
pub use wrapper::{Retryable, make_retryable};
