//! Caller-side retries for transient failures.
//!
//! The client itself makes exactly one attempt per call. Wrap a call in
//! [`RetryPolicy::run`] to repeat it when the error is transient.
//!
//! ```no_run
//! use redmine_client::retry::{RetryPolicy, RetryStrategy};
//! use redmine_client::{Client, Issue};
//! use std::time::Duration;
//!
//! # async fn example(client: Client) -> Result<(), redmine_client::Error> {
//! let policy = RetryPolicy::new(RetryStrategy::ExponentialBackoff {
//!     initial_delay: Duration::from_millis(200),
//!     max_delay: Duration::from_secs(5),
//!     max_retries: 3,
//!     jitter: true,
//! });
//!
//! let issues = policy.run(|| client.list::<Issue>(None)).await?;
//! println!("{} open issues", issues.total_count);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// How long to wait between attempts.
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Never retry.
    #[default]
    None,

    /// `initial_delay * 2^(retry - 1)`, capped at `max_delay`.
    ExponentialBackoff {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Upper bound for any single delay.
        max_delay: Duration,
        /// Retries after the first attempt.
        max_retries: usize,
        /// Scale each delay by a random factor in `0.5..=1.0`.
        jitter: bool,
    },

    /// The same delay before every retry.
    Linear {
        /// Delay between attempts.
        delay: Duration,
        /// Retries after the first attempt.
        max_retries: usize,
    },
}

impl RetryStrategy {
    /// Returns the delay before retry number `retry` (1-indexed), or `None`
    /// once retries are exhausted.
    pub fn delay_for_attempt(&self, retry: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if retry > *max_retries {
                    return None;
                }

                let exponent = u32::try_from(retry.saturating_sub(1)).unwrap_or(u32::MAX);
                let multiplier = 2u32.saturating_pow(exponent);
                let delay = initial_delay.saturating_mul(multiplier).min(*max_delay);

                if *jitter {
                    let factor = rand::thread_rng().gen_range(0.5..=1.0);
                    Some(delay.mul_f64(factor))
                } else {
                    Some(delay)
                }
            }
            RetryStrategy::Linear { delay, max_retries } => {
                (retry <= *max_retries).then_some(*delay)
            }
        }
    }
}

/// Decides whether a failed attempt is worth repeating.
///
/// # Examples
///
/// ```
/// use redmine_client::retry::RetryPredicate;
/// use redmine_client::Error;
///
/// struct OnlyTimeouts;
///
/// impl RetryPredicate for OnlyTimeouts {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         matches!(error, Error::Timeout(_))
///     }
/// }
///
/// assert!(OnlyTimeouts.should_retry(&Error::Timeout(None), 1));
/// assert!(!OnlyTimeouts.should_retry(&Error::Cancelled, 1));
/// ```
pub trait RetryPredicate: Send + Sync {
    /// `attempt` is the 1-indexed attempt that just failed.
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retries whatever [`Error::is_transient`] reports as transient.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTransient;

impl RetryPredicate for RetryOnTransient {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_transient()
    }
}

/// Retries only responses that carried a rate limit hint.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRateLimit;

impl RetryPredicate for RetryOnRateLimit {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.rate_limit_info().is_some()
    }
}

/// Retries if any inner predicate does.
pub struct AnyOf {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AnyOf {
    /// Combines `predicates` with OR.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AnyOf {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates
            .iter()
            .any(|p| p.should_retry(error, attempt))
    }
}

/// Repeats an operation according to a strategy and a predicate.
pub struct RetryPolicy {
    strategy: RetryStrategy,
    predicate: Box<dyn RetryPredicate>,
    max_rate_limit_wait: Duration,
}

impl RetryPolicy {
    /// Default upper bound on a server-requested `Retry-After`.
    pub const DEFAULT_MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

    /// Creates a policy that retries transient errors with `strategy`.
    pub fn new(strategy: RetryStrategy) -> Self {
        Self {
            strategy,
            predicate: Box::new(RetryOnTransient),
            max_rate_limit_wait: Self::DEFAULT_MAX_RATE_LIMIT_WAIT,
        }
    }

    /// Replaces the retry predicate.
    pub fn with_predicate(mut self, predicate: impl RetryPredicate + 'static) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    /// Caps how long a `Retry-After` hint may delay the next attempt.
    pub fn with_max_rate_limit_wait(mut self, max_wait: Duration) -> Self {
        self.max_rate_limit_wait = max_wait;
        self
    }

    /// Runs `operation` until it succeeds, fails permanently, or retries
    /// run out.
    ///
    /// A `Retry-After` hint on the error replaces the strategy's delay.
    ///
    /// # Errors
    ///
    /// Returns the error itself when the predicate rejects it or no retry
    /// was ever possible, and [`Error::MaxRetriesExceeded`] once at least
    /// one retry was made and the strategy is exhausted.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !self.predicate.should_retry(&error, attempt) {
                return Err(error);
            }

            let Some(backoff) = self.strategy.delay_for_attempt(attempt) else {
                if attempt == 1 {
                    return Err(error);
                }
                tracing::warn!(attempts = attempt, error = %error, "Giving up after retries");
                return Err(Error::MaxRetriesExceeded {
                    attempts: attempt,
                    last_error: Box::new(error),
                });
            };

            let delay = match error.rate_limit_delay(self.max_rate_limit_wait) {
                Some(hinted) => {
                    tracing::info!(
                        delay_ms = hinted.as_millis() as u64,
                        attempt = attempt,
                        "Rate limited, honouring Retry-After"
                    );
                    hinted
                }
                None => {
                    tracing::info!(
                        delay_ms = backoff.as_millis() as u64,
                        attempt = attempt,
                        error = %error,
                        "Retrying after transient failure"
                    );
                    backoff
                }
            };

            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimitInfo;
    use http::{Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unavailable(rate_limit_info: Option<RateLimitInfo>) -> Error {
        Error::ServiceUnavailable {
            status: StatusCode::SERVICE_UNAVAILABLE,
            method: Method::GET,
            url: "https://redmine.example.com/issues.json".to_string(),
            raw_response: String::new(),
            rate_limit_info,
        }
    }

    fn quick_linear(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(RetryStrategy::Linear {
            delay: Duration::from_millis(1),
            max_retries,
        })
    }

    #[test]
    fn test_exponential_backoff_delays() {
        let strategy = RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            max_retries: 4,
            jitter: false,
        };

        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_millis(100)));
        assert_eq!(strategy.delay_for_attempt(2), Some(Duration::from_millis(200)));
        assert_eq!(strategy.delay_for_attempt(3), Some(Duration::from_millis(400)));
        assert_eq!(strategy.delay_for_attempt(4), Some(Duration::from_millis(500)));
        assert_eq!(strategy.delay_for_attempt(5), None);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let strategy = RetryStrategy::ExponentialBackoff {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            max_retries: 1,
            jitter: true,
        };

        for _ in 0..50 {
            let delay = strategy.delay_for_attempt(1).unwrap();
            assert!(delay >= Duration::from_millis(50) && delay <= Duration::from_millis(100));
        }
    }

    #[test]
    fn test_linear_delays() {
        let strategy = RetryStrategy::Linear {
            delay: Duration::from_secs(1),
            max_retries: 2,
        };

        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_secs(1)));
        assert_eq!(strategy.delay_for_attempt(2), Some(Duration::from_secs(1)));
        assert_eq!(strategy.delay_for_attempt(3), None);
        assert_eq!(RetryStrategy::None.delay_for_attempt(1), None);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result = quick_linear(3)
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable(None))
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Result<()> = quick_linear(3)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::NotFound {
                    method: Method::GET,
                    url: String::new(),
                })
            })
            .await;

        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts() {
        let result: Result<()> = quick_linear(2).run(|| async { Err(Error::Timeout(None)) }).await;

        match result {
            Err(Error::MaxRetriesExceeded {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last_error, Error::Timeout(_)));
            }
            other => panic!("expected MaxRetriesExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_strategy_returns_original_error() {
        let result: Result<()> = RetryPolicy::default()
            .run(|| async { Err(Error::Timeout(None)) })
            .await;

        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_retry_after_is_capped() {
        let hint = RateLimitInfo {
            retry_after: Some(Duration::from_secs(3600)),
            reset_at: None,
        };
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let started = std::time::Instant::now();

        let result = quick_linear(1)
            .with_max_rate_limit_wait(Duration::from_millis(10))
            .with_predicate(RetryOnRateLimit)
            .run(|| {
                let hint = hint.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(unavailable(Some(hint)))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_any_of() {
        let predicate = AnyOf::new(vec![Box::new(RetryOnRateLimit), Box::new(RetryOnTransient)]);
        assert!(predicate.should_retry(&Error::Timeout(None), 1));
        assert!(!predicate.should_retry(&Error::Cancelled, 1));
    }
}
