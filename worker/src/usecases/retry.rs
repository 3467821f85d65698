use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use crates::domain::value_objects::errors::is_token_limit_exceeded;

/// Attempts for each external generation call, including the first.
pub const GENERATION_ATTEMPTS: usize = 3;

/// Bounded retry with exponential backoff for collaborator calls.
/// Token-limit violations are terminal and returned immediately.
pub async fn with_retries<T, F, Fut>(op_name: &str, max_attempts: usize, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if is_token_limit_exceeded(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let backoff = Duration::from_secs(2u64.pow(attempt as u32 - 1));
                warn!(
                    op = op_name,
                    attempt,
                    backoff_secs = backoff.as_secs(),
                    error = ?err,
                    "operation failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::value_objects::errors::TokenLimitExceeded;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let result = with_retries("op", 3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(anyhow::anyhow!("transient"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_attempt_budget() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retries("op", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("always fails")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn token_limit_errors_bypass_retry() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retries("op", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(anyhow::Error::new(TokenLimitExceeded {
                    token_count: 40_000,
                    max_tokens: 32_000,
                }))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
