//! Caller-side retry helpers. Nothing in this crate retries on its own; these
//! are for callers that decide a retry is appropriate.

use crate::{Credential, ErrorKind, StravaClient, StravaError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// A simple retry policy with exponential backoff and jitter.
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Retry `f` on every error, up to `max_retries` extra attempts.
    pub async fn retry_async<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.retry_async_if(f, |_| true).await
    }

    /// Retry `f` only while `should_retry` accepts the error.
    pub async fn retry_async_if<F, Fut, T, E, P>(&self, mut f: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    // exponential backoff with jitter
                    let max_ms = u64::try_from(self.max_delay(attempt).as_millis())
                        .unwrap_or(u64::MAX)
                        .max(1);
                    let delay = Duration::from_millis(rand::rng().random_range(0..max_ms));
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Upper bound of the jittered delay before retry number `attempt`.
    fn max_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }

    /// Retry Strava calls that failed transiently (transport, 429, 5xx).
    pub async fn retry_transient<F, Fut, T>(&self, f: F) -> Result<T, StravaError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StravaError>>,
    {
        self.retry_async_if(f, StravaError::is_transient).await
    }
}

/// Run `op` with the credential's access token; if the token turns out to be
/// expired, refresh exactly once and run `op` again with the new credential.
///
/// The credential is updated in place when a refresh happened, so the caller
/// can persist it.
pub async fn with_token_refresh<C, F, Fut, T>(
    client: &C,
    credential: &mut Credential,
    mut op: F,
) -> Result<T, StravaError>
where
    C: StravaClient + ?Sized,
    F: FnMut(Credential) -> Fut,
    Fut: Future<Output = Result<T, StravaError>>,
{
    match op(credential.clone()).await {
        Err(e) if e.kind() == ErrorKind::ExpiredToken => {
            tracing::info!("access token rejected; refreshing once");
            *credential = client.refresh(&credential.refresh_token).await?;
            op(credential.clone()).await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_bound_saturates_for_large_base_delay() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(u64::MAX),
        };
        assert_eq!(policy.max_delay(1), Duration::MAX);
        assert_eq!(policy.max_delay(40), Duration::MAX);
        assert_eq!(fast().max_delay(2), Duration::from_millis(4));
    }

    #[tokio::test]
    async fn retry_succeeds_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = fast()
            .retry_async(move || {
                let c = c.clone();
                async move {
                    let prev = c.fetch_add(1, Ordering::SeqCst) + 1;
                    if prev < 3 { Err("fail") } else { Ok(42) }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn expired_token_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = fast()
            .retry_transient(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(StravaError::ExpiredToken)
                }
            })
            .await;
        assert!(matches!(result, Err(StravaError::ExpiredToken)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = fast()
            .retry_transient(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(StravaError::Fetch {
                        status: Some(502),
                        message: "bad gateway".into(),
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
