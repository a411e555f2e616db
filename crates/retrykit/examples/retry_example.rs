//! Example: Retrying a flaky data-access call
//!
//! This example demonstrates:
//! 1. Simple retry with exponential backoff
//! 2. Fatal errors that stop the loop immediately
//! 3. An observer that logs before each retry
//! 4. A retryable wrapper around a function with arguments
//!
//! Run with:
//! ```bash
//! RUST_LOG=retrykit=debug cargo run -p retrykit --example retry_example
//! ```

use retrykit::prelude::*;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// A simulated table client that fails the first few times
struct UnreliableTable {
    attempts: AtomicU32,
    fail_count: u32,
    status: u16,
}

impl UnreliableTable {
    fn new(fail_count: u32, status: u16) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_count,
            status,
        }
    }

    async fn select(&self) -> Result<String, OperationError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            println!("  Attempt {}: FAILED (status {})", attempt + 1, self.status);
            Err(OperationError::new(format!("request failed on attempt {}", attempt + 1))
                .with_status(self.status))
        } else {
            println!("  Attempt {}: SUCCESS", attempt + 1);
            Ok("[{\"id\":1,\"title\":\"write docs\"}]".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: Simple retry with exponential backoff
async fn example_simple_retry() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Simple Retry with Exponential Backoff ===\n");

    let table = UnreliableTable::new(2, 503);
    let overrides = RetryOverrides::default()
        .with_max_retries(3)
        .with_initial_delay(Duration::from_millis(100));

    let start = Instant::now();
    let rows = execute(|| table.select(), overrides).await?;

    println!("\nResult: {rows}");
    println!("Total attempts: {}", table.total_attempts());
    println!("Elapsed: {:?} (expected ~300ms: 100ms + 200ms)", start.elapsed());
    Ok(())
}

/// Example 2: Fatal errors are returned on the first attempt
async fn example_fatal_error() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Fatal Error ===\n");

    let table = UnreliableTable::new(u32::MAX, 401);
    match execute(|| table.select(), RetryOverrides::default()).await {
        Ok(_) => println!("Unexpected success"),
        Err(err) => println!(
            "\nGave up after {} attempt(s): {err} (status {:?})",
            table.total_attempts(),
            err.status_code()
        ),
    }
    Ok(())
}

/// Example 3: Observer hook
async fn example_observer() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Retry Observer ===\n");

    let table = UnreliableTable::new(3, 429);
    let policy = RetryPolicy::builder()
        .max_retries(4)
        .initial_delay(Duration::from_millis(50))
        .max_delay(Duration::from_millis(150))
        .on_retry(|err, attempt| println!("  -> retrying attempt {attempt} after: {err}"))
        .build();

    policy.execute(|| table.select()).await?;
    println!("\nTotal attempts: {}", table.total_attempts());
    Ok(())
}

/// Example 4: Retryable wrapper
async fn example_wrapper() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 4: Retryable Wrapper ===\n");

    let counter = AtomicU32::new(0);
    let fetch_todo = make_retryable(
        |id: u32| {
            let counter = &counter;
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                    Err(OperationError::new("socket hang up").with_code("ECONNRESET"))
                } else {
                    Ok(format!("todo #{id}"))
                }
            }
        },
        RetryOverrides::default().with_initial_delay(Duration::from_millis(20)),
    );

    for id in [1, 2, 3] {
        println!("  fetched {}", fetch_todo.call(id).await?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    example_simple_retry().await?;
    example_fatal_error().await?;
    example_observer().await?;
    example_wrapper().await?;

    println!("\nAll examples completed.");
    Ok(())
}
