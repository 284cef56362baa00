//! Host-wide configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::BackoffPolicy;

/// Settings shared by every pipe a host runs.
///
/// Missing fields take their defaults, so a runner's configuration file only
/// needs to mention what it changes:
///
/// ```rust
/// use pipewater::HostConfig;
/// use std::time::Duration;
///
/// let config = HostConfig::from_json(r#"{ "default_command_timeout_ms": 10000 }"#).unwrap();
///
/// assert_eq!(config.default_timeout(), Duration::from_secs(10));
/// assert_eq!(config.retry_interval_ms, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Timeout for pipes that do not set their own, in milliseconds.
    pub default_command_timeout_ms: u64,
    /// Base wait between evaluation rounds, in milliseconds.
    pub retry_interval_ms: u64,
    /// Grow the wait exponentially up to this cap instead of keeping it
    /// constant.
    pub max_retry_interval_ms: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            default_command_timeout_ms: 4000,
            retry_interval_ms: 16,
            max_retry_interval_ms: None,
        }
    }
}

impl HostConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the default command timeout.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_command_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the base retry interval.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval_ms = duration_ms(interval);
        self
    }

    /// Back off exponentially, capped at `max`.
    pub fn with_max_retry_interval(mut self, max: Duration) -> Self {
        self.max_retry_interval_ms = Some(duration_ms(max));
        self
    }

    /// The default command timeout.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_command_timeout_ms)
    }

    /// The backoff policy these settings describe.
    pub fn backoff(&self) -> BackoffPolicy {
        let base = Duration::from_millis(self.retry_interval_ms);
        match self.max_retry_interval_ms {
            Some(max) => {
                BackoffPolicy::exponential(base).with_max_delay(Duration::from_millis(max))
            }
            None => BackoffPolicy::constant(base),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::BackoffStrategy;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.default_timeout(), Duration::from_millis(4000));
        assert_eq!(
            config.backoff().strategy(),
            &BackoffStrategy::Constant(Duration::from_millis(16))
        );
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(HostConfig::from_json("{}").unwrap(), HostConfig::default());
    }

    #[test]
    fn test_capped_interval_is_exponential() {
        let config = HostConfig::default()
            .with_retry_interval(Duration::from_millis(10))
            .with_max_retry_interval(Duration::from_millis(100));
        let backoff = config.backoff();
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(20));
        assert_eq!(backoff.delay_for_attempt(10), Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(HostConfig::from_json(r#"{ "retry_interval_ms": "fast" }"#).is_err());
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = HostConfig::default().with_default_timeout(Duration::from_millis(50));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(HostConfig::from_json(&json).unwrap(), config);
    }
}
