//! Bounded retry with exponential backoff
//!
//! Retry is modeled as a bounded attempt sequence rather than an
//! open-ended loop: at most `budget` attempts, with a doubling delay
//! between them, and only transient failures re-enter the loop.

use labrelay_core::DispatchErrorKind;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed-size retry schedule applied to one outbound request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first
    pub budget: u32,
    /// Delay before the second attempt; doubles each retry
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            budget: 3,
            base_backoff: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `next` (1-based). Attempt 1 has no delay.
    pub fn backoff_before(&self, next: u32) -> Duration {
        if next <= 1 {
            Duration::ZERO
        } else {
            self.base_backoff * 2u32.saturating_pow(next - 2)
        }
    }

    /// Run an operation under this policy.
    ///
    /// Returns the number of attempts made and the final result. A
    /// non-transient failure ends the sequence immediately; a transient
    /// failure is retried until the budget is spent.
    pub async fn run<F, Fut>(&self, mut op: F) -> (u32, Result<(), DispatchErrorKind>)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), DispatchErrorKind>>,
    {
        let budget = self.budget.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(()) => return (attempt, Ok(())),
                Err(kind) if kind.is_transient() && attempt < budget => {
                    let delay = self.backoff_before(attempt + 1);
                    debug!(
                        attempt,
                        error = %kind,
                        backoff_ms = delay.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(kind) => {
                    if kind.is_transient() {
                        warn!(attempt, error = %kind, "Retry budget exhausted");
                    } else {
                        warn!(attempt, error = %kind, "Non-transient failure, not retrying");
                    }
                    return (attempt, Err(kind));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_before(1), Duration::ZERO);
        assert_eq!(policy.backoff_before(2), Duration::from_millis(300));
        assert_eq!(policy.backoff_before(3), Duration::from_millis(600));
        assert_eq!(policy.backoff_before(4), Duration::from_millis(1200));
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            budget: 3,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let (attempts, result) = fast_policy().run(|| async { Ok(()) }).await;
        assert_eq!(attempts, 1);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_transient_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let (attempts, result) = fast_policy()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(DispatchErrorKind::Timeout) }
            })
            .await;
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result, Err(DispatchErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_non_transient_single_attempt() {
        let calls = AtomicU32::new(0);
        let (attempts, result) = fast_policy()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(DispatchErrorKind::Rejected(404)) }
            })
            .await;
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result, Err(DispatchErrorKind::Rejected(404)));
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let (attempts, result) = fast_policy()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(DispatchErrorKind::Timeout)
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        assert_eq!(attempts, 3);
        assert!(result.is_ok());
    }
}
