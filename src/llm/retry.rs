//! Iterative exponential-backoff retry policy for the LLM adapter (§4.2, §9).
//!
//! Retries only [`LlmError::Transient`] failures — rate limits, 5xx, network
//! errors, empty candidates. Truncation, safety blocks, and JSON parse
//! failures are never retried, since repeating an identical prompt
//! reproduces them identically.

use crate::error::{Error, LlmError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry policy configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay for the exponential backoff (`base * 2^attempt`).
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Runs `f` up to `max_attempts` times, iteratively backing off between
    /// transient failures. Non-transient errors return immediately without
    /// consuming further attempts.
    pub async fn run<F, Fut, T>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error: Option<Error> = None;

        for attempt in 0..self.max_attempts {
            match f().await {
                Ok(value) => return Ok(value),
                Err(Error::Llm(err)) if err.is_retryable() => {
                    warn!(attempt, error = %err, "transient LLM failure, retrying");
                    last_error = Some(Error::Llm(err));
                    if attempt + 1 < self.max_attempts {
                        sleep(self.base_delay * 2u32.pow(attempt)).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }

        let last_error_message = last_error.map_or_else(|| "unknown".to_string(), |e| e.to_string());
        Err(LlmError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error: last_error_message,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let result = policy.run(|| async { Ok::<_, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let result = policy
            .run(|| async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(LlmError::Transient("503".to_string()).into())
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_truncation() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let result: Result<i32> = policy
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(LlmError::Truncated {
                    max_output_tokens: 100,
                    consumed: 100,
                }
                .into())
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        };
        let result: Result<i32> = policy
            .run(|| async { Err(LlmError::Transient("boom".to_string()).into()) })
            .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Llm(LlmError::RetriesExhausted { attempts: 2, .. })
        ));
    }
}
