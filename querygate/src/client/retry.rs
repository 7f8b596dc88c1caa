use std::future::Future;

use super::config::RetryPolicy;
use super::error::ClientError;

/// Run `operation` until it succeeds, fails terminally, or the policy runs
/// out of attempts.
///
/// Only [`ClientError::is_transient`] errors are retried, after the
/// policy's backoff. The delay uses `tokio::time::sleep`, so a paused test
/// clock makes it deterministic.
///
/// # Errors
///
/// A terminal error is returned as-is. When every attempt failed
/// transiently the last error is wrapped in
/// [`ClientError::RetriesExhausted`].
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) if attempt >= max_attempts => {
                tracing::warn!(attempts = attempt, error = %err, "giving up after transient failures");
                return Err(ClientError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
            Err(err) => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn unavailable() -> ClientError {
        ClientError::Status {
            status: 503,
            body: String::new(),
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }

    /// Fails transiently `failures` times, then returns the attempt count.
    fn flaky(failures: u32) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<u32, ClientError>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let operation = move || {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if call <= failures { Err(unavailable()) } else { Ok(call) })
        };
        (calls, operation)
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_transient_failures() {
        for k in 0..4 {
            let (calls, operation) = flaky(k);
            let result = retry(&policy(5), operation).await.unwrap();
            assert_eq!(result, k + 1);
            assert_eq!(calls.load(Ordering::SeqCst), k + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_elapses_on_the_paused_clock() {
        let start = tokio::time::Instant::now();
        let (_, operation) = flaky(2);
        retry(&policy(3), operation).await.unwrap();
        // 100ms after the first failure, 200ms after the second
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_wraps_last_error() {
        let (calls, operation) = flaky(10);
        let err = retry(&policy(3), operation).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            ClientError::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, ClientError::Status { status: 503, .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let err = retry(&policy(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err::<(), _>(ClientError::Status {
                status: 400,
                body: String::new(),
            }))
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, ClientError::Status { status: 400, .. }));
    }
}
