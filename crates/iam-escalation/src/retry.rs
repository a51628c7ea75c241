//! Bounded retry with pluggable backoff.
//!
//! Attempts run sequentially. A terminal error or a success ends the loop
//! at once; otherwise the loop sleeps for the backoff delay and tries again
//! until the attempt bound is reached. There is no sleep after the last
//! attempt.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Delay between attempts.
#[derive(Clone)]
pub enum Backoff {
    /// Retry immediately.
    None,

    /// The same delay after every failed attempt.
    Fixed(Duration),

    /// `initial * 2^(n-1)` after the n-th failure, capped at `max`.
    Exponential { initial: Duration, max: Duration },

    /// Arbitrary delay as a function of the failed attempt number (1-based).
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl Backoff {
    /// Delay to wait after the `attempt`-th failure.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { initial, max } => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(*max)
            }
            Backoff::Custom(f) => f(attempt),
        }
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::None => f.write_str("None"),
            Backoff::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            Backoff::Exponential { initial, max } => f
                .debug_struct("Exponential")
                .field("initial", initial)
                .field("max", max)
                .finish(),
            Backoff::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    /// Three attempts, three seconds apart.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(3)),
        }
    }
}

/// The result of a retried operation and how many attempts it took.
#[derive(Debug)]
pub struct Retried<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl RetryPolicy {
    /// Create a policy. At least one attempt is always made.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self::new(1, Backoff::None)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Run `op` until it succeeds, fails terminally, or the attempts run out.
    pub async fn run<T, E, F, Fut>(&self, mut op: F, is_terminal: impl Fn(&E) -> bool) -> Retried<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 1;
        loop {
            let error = match op().await {
                Ok(value) => {
                    return Retried {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) if is_terminal(&e) || attempt >= self.max_attempts => {
                    return Retried {
                        result: Err(e),
                        attempts: attempt,
                    }
                }
                Err(e) => e,
            };

            let delay = self.backoff.delay(attempt);
            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                ?delay,
                %error,
                "attempt failed, retrying"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Terminal,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn terminal(e: &TestError) -> bool {
        *e == TestError::Terminal
    }

    #[test]
    fn test_backoff_delays() {
        assert_eq!(Backoff::None.delay(5), Duration::ZERO);
        assert_eq!(Backoff::Fixed(Duration::from_secs(3)).delay(2), Duration::from_secs(3));

        let exp = Backoff::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(1),
        };
        assert_eq!(exp.delay(1), Duration::from_millis(100));
        assert_eq!(exp.delay(2), Duration::from_millis(200));
        assert_eq!(exp.delay(4), Duration::from_millis(800));
        assert_eq!(exp.delay(5), Duration::from_secs(1));
        assert_eq!(exp.delay(64), Duration::from_secs(1));

        let custom = Backoff::Custom(Arc::new(|n| Duration::from_secs(u64::from(n) * 10)));
        assert_eq!(custom.delay(3), Duration::from_secs(30));
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Backoff::None).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try_does_not_sleep() {
        let start = tokio::time::Instant::now();

        let retried = RetryPolicy::default()
            .run(|| async { Ok::<_, TestError>(7) }, terminal)
            .await;

        assert_eq!(retried.result, Ok(7));
        assert_eq!(retried.attempts, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let retried = RetryPolicy::default()
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(TestError::Terminal) }
                },
                terminal,
            )
            .await;

        assert_eq!(retried.result, Err(TestError::Terminal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_exhaust_bound() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let retried = RetryPolicy::default()
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(TestError::Transient) }
                },
                terminal,
            )
            .await;

        assert_eq!(retried.result, Err(TestError::Transient));
        assert_eq!(retried.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two sleeps: between attempts 1-2 and 2-3
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_error() {
        let calls = AtomicU32::new(0);

        let retried = RetryPolicy::new(5, Backoff::Fixed(Duration::from_secs(1)))
            .run(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(TestError::Transient)
                        } else {
                            Ok("done")
                        }
                    }
                },
                terminal,
            )
            .await;

        assert_eq!(retried.result, Ok("done"));
        assert_eq!(retried.attempts, 3);
    }
}
