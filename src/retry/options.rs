//! Per-invocation options.

use std::time::Duration;

/// Options for one pipe invocation.
///
/// The timeout is fixed for the whole invocation; retries never extend it.
/// When unset, the host's default command timeout applies.
///
/// ```rust
/// use pipewater::PipeOptions;
/// use std::time::Duration;
///
/// let options = PipeOptions::new()
///     .with_timeout(Duration::from_millis(50))
///     .with_log(false);
///
/// assert_eq!(options.timeout(), Some(Duration::from_millis(50)));
/// assert!(!options.log());
/// assert!(PipeOptions::default().log());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeOptions {
    timeout: Option<Duration>,
    log: bool,
}

impl Default for PipeOptions {
    fn default() -> Self {
        PipeOptions {
            timeout: None,
            log: true,
        }
    }
}

impl PipeOptions {
    /// Default options: host timeout, logging enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry for at most `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable the diagnostic record.
    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// The explicit timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether a diagnostic record is opened.
    pub fn log(&self) -> bool {
        self.log
    }
}
