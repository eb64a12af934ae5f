//! Retry policy for transient failures.
//!
//! The client retries network errors, timeouts, rate limits and server errors
//! with exponential backoff. A rate limit that carries a `Retry-After` hint
//! waits for exactly that long instead.

use crate::Error;
use std::time::Duration;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Decides whether and when a failed attempt is retried.
///
/// # Examples
///
/// ```
/// use verifykit::RetryPolicy;
/// use std::time::Duration;
///
/// // 1s, 2s, 4s between attempts
/// let policy = RetryPolicy::new(3);
/// assert_eq!(policy.backoff(0), Duration::from_secs(1));
/// assert_eq!(policy.backoff(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// The delay before the first retry; doubled for every further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the default one second base delay.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Returns `true` if the attempt that produced `error` should be retried.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The zero-based attempt that just failed
    /// * `error` - The error it failed with
    pub fn should_retry(&self, attempt: u32, error: &Error) -> bool {
        attempt < self.max_retries && error.is_retryable()
    }

    /// Returns the exponential delay after the given zero-based attempt:
    /// `base_delay * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(multiplier)
    }

    /// Returns the delay before retrying after `error`.
    ///
    /// Rate limit errors with a `Retry-After` hint wait for the hinted number
    /// of seconds; everything else uses [`RetryPolicy::backoff`].
    pub fn delay_for(&self, attempt: u32, error: &Error) -> Duration {
        match error {
            Error::RateLimit {
                retry_after: Some(seconds),
                ..
            } => Duration::from_secs(*seconds),
            _ => self.backoff(attempt),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_RETRIES)
    }
}
