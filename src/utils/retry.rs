use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Retry policy for external-catalog calls: fixed attempt count with
/// exponential backoff, no jitter, no circuit breaker.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

/// Runs `op` up to `policy.max_attempts` times, sleeping `initial_delay`
/// after the first failure and doubling the delay after each subsequent one.
/// The final failure's error is re-raised unchanged.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        if attempt > 1 {
            info!(attempt, max_attempts, "retrying");
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn returns_first_success_without_retrying() {
        let calls = Cell::new(0u32);
        let result: Result<u32, String> = retry_with_backoff(fast_policy(3), || {
            calls.set(calls.get() + 1);
            async { Ok(7) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result: Result<&str, String> = retry_with_backoff(fast_policy(3), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(format!("transient {n}"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn propagates_the_final_error_after_exhaustion() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = retry_with_backoff(fast_policy(3), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Err(format!("failure {n}")) }
        })
        .await;

        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(calls.get(), 3);
    }
}
