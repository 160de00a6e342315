//! Retry policy for device acquisitions
//!
//! An attempt either yields a value, yields nothing (an empty or failed
//! report, worth another try) or fails with an error. Recoverable errors are
//! retried like empty results; anything else ends the loop at once.

use crate::error::{AppError, Result};
use crate::logging::AcquisitionLogger;
use crate::models::Config;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How often and how patiently an acquisition is retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum attempts, 0 for unlimited
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Factor applied to the delay after every further failure (1.0 = fixed)
    pub backoff_multiplier: f64,
    /// Upper bound for any delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::defaults::DEFAULT_MAX_ATTEMPTS,
            initial_delay: crate::defaults::DEFAULT_RETRY_DELAY,
            backoff_multiplier: crate::defaults::DEFAULT_RETRY_MULTIPLIER,
            max_delay: crate::defaults::DEFAULT_RETRY_MAX_DELAY,
        }
    }
}

/// A value together with the number of attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Acquired<T> {
    pub value: T,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.retry_delay_ms),
            backoff_multiplier: config.retry_multiplier,
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Fixed delay between at most `max_attempts` attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            backoff_multiplier: 1.0,
            max_delay: delay,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_attempts == 0
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based)
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        self.is_unlimited() || attempt < self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()).max(0.0))
    }

    /// Run `attempt_fn` until it yields a value.
    ///
    /// `attempt_fn` receives the 1-based attempt number. `Ok(None)` and
    /// recoverable errors lead to another attempt; other errors are returned
    /// immediately. Running out of attempts yields `RetriesExhausted`.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        logger: &AcquisitionLogger,
        mut attempt_fn: F,
    ) -> Result<Acquired<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            logger.log_attempt(operation, attempt, self.max_attempts).await;

            let reason = match attempt_fn(attempt).await {
                Ok(Some(value)) => return Ok(Acquired { value, attempts: attempt }),
                Ok(None) => "no valid samples".to_string(),
                Err(error) if error.is_recoverable() => error.to_string(),
                Err(error) => return Err(error),
            };

            if !self.allows_retry_after(attempt) {
                return Err(AppError::retries_exhausted(operation, attempt));
            }

            let delay = self.delay_after(attempt);
            logger.log_retry(operation, attempt, delay, &reason).await;
            sleep(delay).await;
        }
    }
}
