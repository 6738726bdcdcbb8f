//! Retry policy for the wrapped task.

use std::time::Duration;

/// How often a failing task is re-run and how long to wait in between.
///
/// The delay is fixed: every retry waits the same amount of time, and no
/// delay follows the final attempt.
///
/// ```
/// use std::time::Duration;
/// use hermes::RetryPolicy;
///
/// let policy = RetryPolicy::new(2, Duration::from_secs(5));
/// assert_eq!(policy.max_attempts(), 3);
/// assert!(policy.should_retry(2));
/// assert!(!policy.should_retry(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns `true` if another attempt should follow.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that just failed (1-based)
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// The pause to observe after `attempt` failed, or `None` when that
    /// failure is terminal.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        self.should_retry(attempt).then_some(self.delay)
    }
}
