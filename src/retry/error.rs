//! Error types for pipe invocations.

use std::fmt;
use std::time::Duration;

use crate::assertion::AssertionError;
use crate::outcome::TransformError;

/// Why one evaluation round did not settle.
///
/// Both kinds are retryable; the engine keeps only the most recent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The transform itself failed.
    Transform(TransformError),
    /// The transform yielded a value the assertion rejected.
    Assertion(AssertionError),
}

impl Failure {
    /// Returns true if the transform failed.
    pub fn is_transform(&self) -> bool {
        matches!(self, Failure::Transform(_))
    }

    /// Returns true if the assertion rejected the value.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Failure::Assertion(_))
    }
}

impl From<TransformError> for Failure {
    fn from(error: TransformError) -> Self {
        Failure::Transform(error)
    }
}

impl From<AssertionError> for Failure {
    fn from(error: AssertionError) -> Self {
        Failure::Assertion(error)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Transform(e) => write!(f, "{}", e),
            Failure::Assertion(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::Transform(e) => Some(e),
            Failure::Assertion(e) => Some(e),
        }
    }
}

/// Error returned when a pipe never settled within its timeout.
///
/// The message names the timeout and carries the last failure, so it tells
/// apart "the transform kept failing" from "the value stabilized at the wrong
/// thing":
///
/// ```rust
/// use pipewater::assertion::AssertionError;
/// use pipewater::retry::{Failure, TimedOut};
/// use std::time::Duration;
///
/// let err = TimedOut::new(
///     Duration::from_millis(50),
///     Duration::from_millis(48),
///     4,
///     Some(Failure::Assertion(AssertionError::new("expected 'bar' to equal 'baz'"))),
/// );
///
/// assert_eq!(
///     err.to_string(),
///     "Timed out retrying after 50ms: expected 'bar' to equal 'baz'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedOut {
    /// The configured timeout.
    pub timeout: Duration,
    /// Time spent before giving up.
    pub elapsed: Duration,
    /// Number of evaluations made.
    pub attempts: u32,
    /// The failure of the final evaluation round.
    pub last_error: Option<Failure>,
}

impl TimedOut {
    /// Create a timeout error.
    pub fn new(
        timeout: Duration,
        elapsed: Duration,
        attempts: u32,
        last_error: Option<Failure>,
    ) -> Self {
        TimedOut {
            timeout,
            elapsed,
            attempts,
            last_error,
        }
    }

    /// Get a reference to the last failure.
    pub fn last_error(&self) -> Option<&Failure> {
        self.last_error.as_ref()
    }
}

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timed out retrying after {}ms", self.timeout.as_millis())?;
        if let Some(last) = &self.last_error {
            write!(f, ": {}", last)?;
        }
        Ok(())
    }
}

impl std::error::Error for TimedOut {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
