//! Bounded retry for API calls that race with server-side cleanup.

use std::future::Future;
use std::time::Duration;

use cloudstack::{Error, Result};
use tracing::debug;

/// Pause between attempts. Deletes race against the server tearing down
/// dependent entities, which can take a while.
const RETRY_PAUSE: Duration = Duration::from_secs(30);

/// Runs `op` up to `attempts` times and returns the first success or the
/// last error. An async job timeout is returned immediately: retrying
/// would just double the wait.
pub async fn retry<T, F, Fut>(attempts: usize, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_pause(attempts, RETRY_PAUSE, op).await
}

pub async fn retry_with_pause<T, F, Fut>(attempts: usize, pause: Duration, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt >= attempts || matches!(e, Error::JobTimeout(_)) => return Err(e),
            Err(e) => {
                debug!(attempt, error = %e, "retrying failed API call");
                attempt += 1;
                tokio::time::sleep(pause).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn flaky_error() -> Error {
        Error::Api {
            error_code: 431,
            cs_error_code: 0,
            error_text: "transient".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_pause(3, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Error>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_pause(3, Duration::ZERO, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(flaky_error())
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_with_last_error() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_pause(3, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(flaky_error())
        })
        .await;
        assert!(matches!(result, Err(Error::Api { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn job_timeout_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_pause(3, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::JobTimeout("job-1".to_string()))
        })
        .await;
        assert!(matches!(result, Err(Error::JobTimeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
