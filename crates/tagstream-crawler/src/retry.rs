//! Bounded retry with a fixed inter-attempt delay.
//!
//! The delay is deliberately flat rather than exponential: the upstream
//! aggregation API is rate-limited per account, and a fixed courtesy pause
//! keeps retried calls inside the same budget as first attempts.

use std::future::Future;
use std::time::Duration;

/// Execute `operation` up to `max_attempts` times, sleeping `delay` between
/// attempts.
///
/// The final failure is returned unchanged — callers match on the original
/// error type, not a retry wrapper. Each attempt re-executes the full
/// operation, including any upstream call; callers accept duplicate calls
/// on retry.
///
/// # Errors
///
/// Returns the last attempt's error once `max_attempts` attempts have failed.
pub async fn with_retry<T, E, F, Fut>(
    max_attempts: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "attempt failed, retrying after delay"
                );
            }
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
