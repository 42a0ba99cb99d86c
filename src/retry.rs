//! Bounded retry with exponential backoff, jitter and cooperative cancellation.
//!
//! [`retry`] knows nothing about what the operation does: any `Err` is treated
//! as retryable. The only suspension point is the backoff sleep, which races
//! the caller's [`CancellationToken`]. An attempt already in flight is never
//! interrupted.

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Maps the current backoff to the extra delay added on top of it.
pub type JitterFn = Arc<dyn Fn(Duration) -> Duration + Send + Sync>;

#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Backoff before the first retry, doubled after every completed wait.
    pub base_backoff: Duration,
    /// Upper bound on the applied delay and on the internal backoff.
    pub max_backoff: Duration,
    pub jitter: JitterFn,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
            max_backoff,
            jitter: Arc::new(half_jitter),
        }
    }

    pub fn with_jitter<F>(mut self, jitter: F) -> Self
    where
        F: Fn(Duration) -> Duration + Send + Sync + 'static,
    {
        self.jitter = Arc::new(jitter);
        self
    }

    /// Deterministic delays, mostly useful in tests.
    pub fn no_jitter(self) -> Self {
        self.with_jitter(|_| Duration::ZERO)
    }

    /// Delay applied for the given backoff: `backoff + jitter(backoff)`,
    /// clamped to `max_backoff`.
    pub fn delay_for(&self, backoff: Duration) -> Duration {
        backoff
            .saturating_add((self.jitter)(backoff))
            .min(self.max_backoff)
    }

    fn next_backoff(&self, backoff: Duration) -> Duration {
        backoff.saturating_mul(2).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100), Duration::from_secs(2))
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_backoff", &self.base_backoff)
            .field("max_backoff", &self.max_backoff)
            .finish_non_exhaustive()
    }
}

/// Default jitter: half of the current backoff.
pub fn half_jitter(backoff: Duration) -> Duration {
    backoff / 2
}

/// Uniformly random jitter in `[0, backoff / 2]`.
pub fn random_jitter(backoff: Duration) -> Duration {
    let ceiling = (backoff / 2).as_micros().min(u64::MAX as u128) as u64;
    if ceiling == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(rand::thread_rng().gen_range(0..=ceiling))
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("operation cancelled")]
    Cancelled,

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled)
    }
}

/// Run `operation` until it succeeds, the retry budget is spent, or `token`
/// fires during a backoff wait.
pub async fn retry<T, E, F, Fut>(
    token: &CancellationToken,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts: u32 = 0;
    let mut backoff = policy.base_backoff;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        attempts += 1;
        if attempts > policy.max_retries {
            return Err(RetryError::Exhausted {
                attempts,
                last: err,
            });
        }

        let delay = policy.delay_for(backoff);
        tokio::select! {
            biased;
            _ = token.cancelled() => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        backoff = policy.next_backoff(backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32, base_ms: u64, max_ms: u64) -> RetryPolicy {
        RetryPolicy::new(
            max_retries,
            Duration::from_millis(base_ms),
            Duration::from_millis(max_ms),
        )
        .no_jitter()
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, RetryError<&str>> =
            retry(&CancellationToken::new(), &policy(3, 10, 100), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retry() {
        let calls = &AtomicU32::new(0);
        let result = retry(&CancellationToken::new(), &policy(3, 1, 10), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("failed")
            } else {
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_calls_max_retries_plus_one() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(&CancellationToken::new(), &policy(2, 1, 5), || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(format!("failure {}", n))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "failure 3");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_calls_once() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(&CancellationToken::new(), &policy(0, 1, 5), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("nope")
        })
        .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_stops_before_next_attempt() {
        let token = CancellationToken::new();
        token.cancel();

        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(&token, &policy(5, 10, 100), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("failed")
        })
        .await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_wait() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(&token, &policy(10, 1_000, 10_000), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("failed")
        })
        .await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_and_is_clamped() {
        let start = tokio::time::Instant::now();
        let _: Result<(), _> = retry(&CancellationToken::new(), &policy(4, 100, 300), || async move {
            Err("failed")
        })
        .await;

        // Waits of 100 + 200 + 300 + 300 ms.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(900), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(1_000), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_delay_for_adds_jitter_then_clamps() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_millis(120));
        assert_eq!(
            policy.delay_for(Duration::from_millis(60)),
            Duration::from_millis(90)
        );
        assert_eq!(
            policy.delay_for(Duration::from_millis(100)),
            Duration::from_millis(120)
        );
    }

    #[test]
    fn test_internal_backoff_growth_is_capped() {
        let policy = policy(3, 100, 2_000);
        let mut backoff = policy.base_backoff;
        for _ in 0..200 {
            backoff = policy.next_backoff(backoff);
        }
        assert_eq!(backoff, policy.max_backoff);
    }

    #[test]
    fn test_default_jitter_is_half_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(
            (policy.jitter)(Duration::from_millis(100)),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_random_jitter_stays_within_half_backoff() {
        for _ in 0..100 {
            let jitter = random_jitter(Duration::from_millis(100));
            assert!(jitter <= Duration::from_millis(50));
        }
        assert_eq!(random_jitter(Duration::ZERO), Duration::ZERO);
    }
}
