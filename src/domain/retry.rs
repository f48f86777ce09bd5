//! Retry Policy
//!
//! One backoff policy for every network call: exponential delay on transport
//! errors, the server's own delay on rate limiting, and a shared attempt
//! budget across both.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use super::error::TradeError;

/// Exponent cap so the doubling never overflows
const MAX_BACKOFF_EXPONENT: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on every further attempt
    pub base_delay: Duration,
    /// Upper bound of random extra delay added to exponential backoff
    pub jitter: Duration,
    /// Use the server's retry-after hint on 429 responses
    pub honor_server_delay: bool,
    /// Delay used on 429 when the server sends no usable hint
    pub default_server_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            jitter: Duration::ZERO,
            honor_server_delay: true,
            default_server_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Exponential delay after the given (zero-based) failed attempt
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(MAX_BACKOFF_EXPONENT));
        let delay = self.base_delay.saturating_mul(factor);
        if self.jitter.is_zero() {
            return delay;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        delay + Duration::from_millis(extra)
    }

    /// Delay before retrying after `error`, or `None` if it must not be retried
    pub fn delay_for(&self, attempt: u32, error: &TradeError) -> Option<Duration> {
        match error {
            TradeError::RateLimited { retry_after } => {
                let server = retry_after.filter(|_| self.honor_server_delay);
                Some(server.unwrap_or(self.default_server_delay))
            }
            TradeError::Transient(_) => Some(self.backoff_delay(attempt)),
            _ => None,
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// The closure receives the zero-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, TradeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, TradeError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let Some(delay) = self.delay_for(attempt, &error) else {
                tracing::debug!("[{}] permanent failure: {}", label, error);
                return Err(error);
            };

            let is_last = attempt + 1 >= self.max_attempts;
            if error.is_rate_limit() {
                tracing::warn!(
                    "[{}] rate limited, retrying after {:?} (attempt {}/{})",
                    label, delay, attempt + 1, self.max_attempts
                );
            } else {
                tracing::error!(
                    "[{}] error on attempt {}/{}: {}",
                    label, attempt + 1, self.max_attempts, error
                );
            }
            last_error = Some(error);

            if !is_last {
                tokio::time::sleep(delay).await;
            }
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts allowed".to_string());
        tracing::error!("[{}] maximum retries reached", label);
        Err(TradeError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.default_server_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_jitter_bounded() {
        let policy = RetryPolicy::default().with_jitter(Duration::from_millis(250));
        for _ in 0..20 {
            let delay = policy.backoff_delay(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_millis(2_250));
        }
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(u32::MAX), policy.backoff_delay(MAX_BACKOFF_EXPONENT));
    }

    #[test]
    fn test_server_delay_override() {
        let policy = RetryPolicy::default();
        let hinted = TradeError::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        let bare = TradeError::RateLimited { retry_after: None };

        assert_eq!(policy.delay_for(0, &hinted), Some(Duration::from_secs(7)));
        assert_eq!(policy.delay_for(0, &bare), Some(Duration::from_secs(5)));

        let ignoring = RetryPolicy {
            honor_server_delay: false,
            ..RetryPolicy::default()
        };
        assert_eq!(ignoring.delay_for(0, &hinted), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_permanent_errors_not_delayed() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0, &TradeError::Validation("x".into())), None);
        assert_eq!(
            policy.delay_for(0, &TradeError::Rejected { status: 500, body: String::new() }),
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exhausts_budget() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = policy
            .run("test", |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TradeError::Transient("down".into()))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(matches!(
            result,
            Err(TradeError::RetriesExhausted { attempts: 5, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sleeps_exponentially_between_attempts() {
        let policy = RetryPolicy::default().with_max_attempts(3);
        let start = Instant::now();

        let _: Result<(), _> = policy
            .run("test", |_| async { Err(TradeError::Transient("down".into())) })
            .await;

        // 1s + 2s, no sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_honours_retry_after() {
        let policy = RetryPolicy::default();
        let start = Instant::now();

        let result = policy
            .run("test", |attempt| async move {
                if attempt == 0 {
                    Err(TradeError::RateLimited {
                        retry_after: Some(Duration::from_secs(9)),
                    })
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result, Ok(1));
        assert_eq!(start.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_permanent_error() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = policy
            .run("test", |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TradeError::Validation("no route".into()))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(TradeError::Validation(_))));
    }
}
