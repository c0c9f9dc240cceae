use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Bounded retries with a fixed backoff.
///
/// An operation run under a policy is attempted at most
/// `1 + max_retries` times. Every failure is logged; between attempts the
/// caller's task sleeps for `backoff`. The error of the final attempt is
/// returned unchanged.
///
/// The policy does not classify errors. A local disk failure is retried
/// exactly like a dropped connection.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use strata_fetch::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(200));
/// assert_eq!(policy.attempts(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Pause before each retry.
    pub backoff:     Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, backoff: Duration) -> Self { Self { max_retries, backoff } }

    /// A single attempt, no retries.
    pub const fn none() -> Self { Self::new(0, Duration::ZERO) }

    /// Total number of attempts, the initial one included.
    pub const fn attempts(&self) -> u32 { self.max_retries.saturating_add(1) }

    /// Run `op` until it succeeds or the retry budget is spent.
    ///
    /// `label` names the operation in log lines.
    pub async fn run<T, E, F, Fut>(&self, label: impl fmt::Display, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run_until(&CancellationToken::new(), label, op).await
    }

    /// Like [`run`](Self::run), but no new attempt starts once `cancel` has
    /// fired. A backoff in progress is cut short and the last error returned.
    pub async fn run_until<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        label: impl fmt::Display,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if cancel.is_cancelled() => {
                    debug!(%label, attempt, error = %err, "cancelled, not retrying");
                    return Err(err);
                }
                Err(err) if attempt > self.max_retries => {
                    warn!(%label, attempt, error = %err, "giving up");
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        %label,
                        attempt,
                        error = %err,
                        backoff = ?self.backoff,
                        "attempt failed, retrying"
                    );
                    if !self.backoff.is_zero() {
                        tokio::select! {
                            () = tokio::time::sleep(self.backoff) => {}
                            () = cancel.cancelled() => {
                                debug!(%label, attempt, "cancelled during backoff");
                                return Err(err);
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::new(5, Duration::from_secs(3)) }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Boom(u32);

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "boom #{}", self.0) }
    }

    #[tokio::test]
    async fn test_always_failing_runs_max_retries_plus_one() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result: Result<(), Boom> = policy
            .run("always fails", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(Boom(n))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // the last failure comes back untouched
        assert_eq!(result, Err(Boom(4)));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(5, Duration::ZERO);

        let result: Result<u32, Boom> = policy
            .run("flaky", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(Boom(n)) } else { Ok(n) }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), Boom> = RetryPolicy::none()
            .run("once", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Boom(1))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_backoff_between_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_secs(3));
        let started = tokio::time::Instant::now();

        let result: Result<(), Boom> = policy.run("slow", || async { Err(Boom(0)) }).await;

        assert!(result.is_err());
        // two pauses, none after the final attempt
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(9), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_stops_retrying() {
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let (counter, token) = (&calls, &cancel);
        let policy = RetryPolicy::new(5, Duration::from_secs(3));
        let started = tokio::time::Instant::now();

        let result: Result<(), Boom> = policy
            .run_until(&cancel, "sibling failed", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                token.cancel();
                Err(Boom(n))
            })
            .await;

        assert_eq!(result, Err(Boom(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_cuts_backoff_short() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let policy = RetryPolicy::new(5, Duration::from_secs(60));
        let started = tokio::time::Instant::now();

        let result: Result<(), Boom> = policy.run_until(&cancel, "slow", || async { Err(Boom(0)) }).await;

        assert!(result.is_err());
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_secs(60), "{elapsed:?}");
    }

    #[test]
    fn test_attempts_saturates() {
        assert_eq!(RetryPolicy::new(u32::MAX, Duration::ZERO).attempts(), u32::MAX);
    }
}
