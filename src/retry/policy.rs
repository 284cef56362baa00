//! Backoff between evaluation rounds.

use std::time::Duration;

/// How long a host waits before re-evaluating a transform.
///
/// Policies are pure data. A pipe is bounded by its timeout, not by an
/// attempt count, so [`next_delay`](Self::next_delay) shortens the last wait
/// to whatever budget remains and stops only once none is left.
///
/// # Examples
///
/// ```rust
/// use pipewater::BackoffPolicy;
/// use std::time::Duration;
///
/// let policy = BackoffPolicy::exponential(Duration::from_millis(10))
///     .with_max_delay(Duration::from_millis(50));
///
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(10));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(40));
/// assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(50)); // capped
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    strategy: BackoffStrategy,
    max_delay: Option<Duration>,
}

/// The shape of the delay sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed delay between rounds.
    Constant(Duration),
    /// Delay increases linearly: base * (attempt + 1).
    Linear {
        /// Base delay duration.
        base: Duration,
    },
    /// Delay doubles: base * 2^attempt.
    Exponential {
        /// Base delay duration.
        base: Duration,
    },
}

/// Interval between retries when the host does not configure one.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(16);

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::constant(DEFAULT_RETRY_INTERVAL)
    }
}

impl BackoffPolicy {
    /// Wait the same amount before every round.
    pub fn constant(delay: Duration) -> Self {
        BackoffPolicy {
            strategy: BackoffStrategy::Constant(delay),
            max_delay: None,
        }
    }

    /// Wait base, 2*base, 3*base, ...
    pub fn linear(base: Duration) -> Self {
        BackoffPolicy {
            strategy: BackoffStrategy::Linear { base },
            max_delay: None,
        }
    }

    /// Wait base, 2*base, 4*base, ...
    pub fn exponential(base: Duration) -> Self {
        BackoffPolicy {
            strategy: BackoffStrategy::Exponential { base },
            max_delay: None,
        }
    }

    /// Cap every delay at `d`.
    pub fn with_max_delay(mut self, d: Duration) -> Self {
        self.max_delay = Some(d);
        self
    }

    /// Get the maximum delay cap.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Get the backoff strategy.
    pub fn strategy(&self) -> &BackoffStrategy {
        &self.strategy
    }

    /// Delay before retry N (0-indexed), ignoring any timeout.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = match &self.strategy {
            BackoffStrategy::Constant(d) => *d,
            BackoffStrategy::Linear { base } => base.saturating_mul(attempt.saturating_add(1)),
            BackoffStrategy::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(attempt))
            }
        };
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    /// Delay before retry N, clamped to the budget left before `timeout`.
    ///
    /// `None` once `elapsed` has reached `timeout`.
    ///
    /// ```rust
    /// use pipewater::BackoffPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = BackoffPolicy::constant(Duration::from_millis(16));
    /// let timeout = Duration::from_millis(50);
    ///
    /// assert_eq!(policy.next_delay(0, Duration::from_millis(30), timeout), Some(Duration::from_millis(16)));
    /// assert_eq!(policy.next_delay(2, Duration::from_millis(40), timeout), Some(Duration::from_millis(10)));
    /// assert!(policy.next_delay(3, Duration::from_millis(50), timeout).is_none());
    /// ```
    pub fn next_delay(&self, attempt: u32, elapsed: Duration, timeout: Duration) -> Option<Duration> {
        let remaining = timeout.checked_sub(elapsed).filter(|r| !r.is_zero())?;
        Some(self.delay_for_attempt(attempt).min(remaining))
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;

    #[test]
    fn test_default_is_constant_16ms() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.strategy(), &BackoffStrategy::Constant(DEFAULT_RETRY_INTERVAL));
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(16));
        assert_eq!(policy.delay_for_attempt(100), Duration::from_millis(16));
    }

    #[test]
    fn test_linear_delay() {
        let policy = BackoffPolicy::linear(Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(300));
    }

    #[test]
    fn test_exponential_delay_with_cap() {
        let policy = BackoffPolicy::exponential(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(500));
        assert_eq!(policy.max_delay(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_exponential_saturates() {
        let policy = BackoffPolicy::exponential(Duration::from_secs(1));
        assert_eq!(
            policy.delay_for_attempt(64),
            Duration::from_secs(u64::from(u32::MAX))
        );
    }

    #[test]
    fn test_next_delay_respects_timeout() {
        let policy = BackoffPolicy::constant(Duration::from_millis(10));
        let timeout = Duration::from_millis(100);
        assert_eq!(
            policy.next_delay(0, Duration::ZERO, timeout),
            Some(Duration::from_millis(10))
        );
        assert_eq!(
            policy.next_delay(5, Duration::from_millis(90), timeout),
            Some(Duration::from_millis(10))
        );
        assert_eq!(
            policy.next_delay(6, Duration::from_millis(91), timeout),
            Some(Duration::from_millis(9))
        );
        assert_eq!(policy.next_delay(7, Duration::from_millis(100), timeout), None);
        assert_eq!(policy.next_delay(8, Duration::from_millis(120), timeout), None);
    }

    #[test]
    fn test_long_delay_is_cut_to_remaining_budget() {
        let policy = BackoffPolicy::exponential(Duration::from_millis(30));
        let timeout = Duration::from_millis(50);
        assert_eq!(
            policy.next_delay(0, Duration::from_millis(5), timeout),
            Some(Duration::from_millis(30))
        );
        assert_eq!(
            policy.next_delay(1, Duration::from_millis(35), timeout),
            Some(Duration::from_millis(15))
        );
    }

    #[test]
    fn test_zero_timeout_never_retries() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_delay(0, Duration::ZERO, Duration::ZERO), None);
    }
}
