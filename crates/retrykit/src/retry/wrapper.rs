//! Binding a retry policy to a function.

use super::strategy::BackoffStrategy;
use crate::classify::RetryableError;
use crate::policy::{RetryOverrides, RetryPolicy};
use std::fmt;
use std::future::Future;

/// Bind `overrides` to `func`, producing a [`Retryable`].
///
/// Every [`Retryable::call`] merges the overrides onto the defaults afresh
/// and runs with its own attempt budget. Arguments are cloned for each
/// attempt; pass several arguments as a tuple.
///
/// # Examples
///
/// ```rust
/// use retrykit::classify::OperationError;
/// use retrykit::policy::RetryOverrides;
/// use retrykit::retry::make_retryable;
///
/// async fn fetch_row(table: &'static str, id: u32) -> Result<String, OperationError> {
///     Ok(format!("{table}:{id}"))
/// }
///
/// # async fn example() -> Result<(), OperationError> {
/// let fetch = make_retryable(
///     |(table, id): (&'static str, u32)| fetch_row(table, id),
///     RetryOverrides::default().with_max_retries(2),
/// );
///
/// assert_eq!(fetch.call(("users", 7)).await?, "users:7");
/// # Ok(())
/// # }
/// ```
pub fn make_retryable<F>(func: F, overrides: RetryOverrides) -> Retryable<F> {
    Retryable { func, overrides }
}

/// A function with retry behavior built in.
///
/// Holds no mutable state; concurrent and sequential calls are independent.
#[derive(Clone)]
pub struct Retryable<F> {
    func: F,
    overrides: RetryOverrides,
}

impl<F> Retryable<F> {
    /// Call the wrapped function with `args`, retrying per the bound policy.
    pub async fn call<A, Fut, T, E>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut + Send + Sync,
        A: Clone + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: RetryableError + Send + Sync + 'static,
    {
        let policy = RetryPolicy::from_overrides(&self.overrides);
        policy.execute(|| (self.func)(args.clone())).await
    }

    /// The overrides applied on every call.
    pub fn overrides(&self) -> &RetryOverrides {
        &self.overrides
    }
}

impl<F> fmt::Debug for Retryable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retryable")
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::OperationError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_calls_have_independent_budgets() {
        let calls: Arc<Mutex<HashMap<&'static str, u32>>> = Arc::default();
        let calls_clone = Arc::clone(&calls);

        let insert = make_retryable(
            move |key: &'static str| {
                let calls = Arc::clone(&calls_clone);
                async move {
                    let count = {
                        let mut calls = calls.lock().unwrap();
                        let count = calls.entry(key).or_insert(0);
                        *count += 1;
                        *count
                    };
                    if key == "flaky" && count < 3 {
                        Err(OperationError::new("busy").with_status(503))
                    } else if key == "down" {
                        Err(OperationError::new("down").with_status(503))
                    } else {
                        Ok(count)
                    }
                }
            },
            RetryOverrides::default()
                .with_max_retries(2)
                .with_initial_delay(Duration::from_millis(10)),
        );

        // exhausts its whole budget
        let down = insert.call("down").await;
        assert_eq!(down.unwrap_err().message(), "down");

        // starts from a fresh budget regardless
        let flaky = insert.call("flaky").await;
        assert_eq!(flaky.unwrap(), 3);

        let calls = calls.lock().unwrap();
        assert_eq!(calls["down"], 3);
        assert_eq!(calls["flaky"], 3);
    }

    #[tokio::test]
    async fn test_arguments_forwarded_to_each_attempt() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let add = make_retryable(
            move |(a, b): (i32, i32)| {
                let seen = Arc::clone(&seen_clone);
                async move {
                    let attempt = {
                        let mut seen = seen.lock().unwrap();
                        seen.push((a, b));
                        seen.len()
                    };
                    if attempt == 1 {
                        Err(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
                    } else {
                        Ok(a + b)
                    }
                }
            },
            RetryOverrides::default().with_initial_delay(Duration::ZERO),
        );

        assert_eq!(add.call((2, 3)).await.unwrap(), 5);
        assert_eq!(*seen.lock().unwrap(), vec![(2, 3), (2, 3)]);
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_isolated() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let double = make_retryable(
            move |n: u32| {
                let attempts = Arc::clone(&attempts_clone);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err(OperationError::new("zero").with_status(400))
                    } else {
                        Ok(n * 2)
                    }
                }
            },
            RetryOverrides::default(),
        );

        let (a, b, c) = tokio::join!(double.call(1), double.call(0), double.call(21));
        assert_eq!(a.unwrap(), 2);
        assert!(b.is_err());
        assert_eq!(c.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_debug_shows_overrides() {
        let wrapped = make_retryable(
            |_: ()| async { Ok::<_, OperationError>(()) },
            RetryOverrides::default().with_max_retries(1),
        );
        let debug = format!("{wrapped:?}");
        assert!(debug.contains("max_retries: Some(1)"));
        assert_eq!(wrapped.overrides().max_retries, Some(1));
    }
}
