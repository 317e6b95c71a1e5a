use std::future::Future;

use tokio::time::Duration;
use tracing::debug;

use super::error::UpstreamError;

/// Run `op` up to `attempts` times, sleeping `backoff_ms * attempt` between
/// tries. Only retryable failures (timeouts, resets, DNS, 429, 5xx) are
/// retried; everything else surfaces immediately.
pub async fn with_retry<T, F, Fut>(
    attempts: u32,
    backoff_ms: u64,
    mut op: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if !e.is_retryable() || attempt >= attempts {
                    return Err(e);
                }
                debug!(
                    "Upstream attempt {}/{} failed ({}), retrying",
                    attempt, attempts, e
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms * u64::from(attempt))).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_then_succeeds() {
        let calls = AtomicU32::new(0);
        let res = with_retry(2, 350, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(UpstreamError::Status {
                        status: 503,
                        body: String::new(),
                    })
                } else {
                    Ok(41 + n)
                }
            }
        })
        .await;
        assert_eq!(res.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_client_errors() {
        let calls = AtomicU32::new(0);
        let res: Result<(), _> = with_retry(2, 350, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(UpstreamError::Status {
                    status: 404,
                    body: String::new(),
                })
            }
        })
        .await;
        assert!(matches!(
            res,
            Err(UpstreamError::Status { status: 404, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_429_and_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let res: Result<(), _> = with_retry(2, 350, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(UpstreamError::Status {
                    status: 429,
                    body: String::new(),
                })
            }
        })
        .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
