//! Retry with exponential backoff
//!
//! Wraps a single remote call. Only transient failures
//! ([`NimbusError::is_transient`]) are retried; anything else is returned on
//! the first attempt.

use crate::config::RetryConfig;
use crate::domain::Result;
use std::future::Future;
use std::time::Duration;

/// Delay before retry number `attempt` (1-based)
///
/// `initial_delay_ms * backoff_multiplier^(attempt - 1)`, capped at `max_delay_ms`.
pub fn backoff_delay(config: &RetryConfig, attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let delay = config.initial_delay_ms as f64 * config.backoff_multiplier.powi(exponent);
    let capped = delay.min(config.max_delay_ms as f64).max(0.0);
    Duration::from_millis(capped as u64)
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out
///
/// A server-provided `Retry-After` hint replaces the computed delay, still
/// bounded by `max_delay_ms`.
///
/// # Errors
///
/// Returns the last error once `max_retries` attempts have failed, or the
/// first non-transient error.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_retries.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if !e.is_transient() || attempt >= max_attempts {
                    return Err(e);
                }

                let delay = match e.retry_after_secs() {
                    Some(secs) => Duration::from_secs(secs)
                        .min(Duration::from_millis(config.max_delay_ms)),
                    None => backoff_delay(config, attempt),
                };

                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying request after transient error"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NimbusError, ResourceGraphError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_config(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_delay_grows_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        };
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(&config, 4), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(&fast_config(3), "test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(NimbusError::Connection("reset".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_error() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&fast_config(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ResourceGraphError::ClientError {
                status: 400,
                message: "BadRequest".to_string(),
            }
            .into())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&fast_config(3), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ResourceGraphError::ServerError {
                status: 503,
                message: "ServiceUnavailable".to_string(),
            }
            .into())
        })
        .await;

        assert!(matches!(
            result,
            Err(NimbusError::ResourceGraph(ResourceGraphError::ServerError { status: 503, .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
