//! Testing utilities for code built on pipes.
//!
//! # Examples
//!
//! ## Flaky transforms
//!
//! ```rust
//! use pipewater::testing::Flaky;
//! use pipewater::{Outcome, Transform};
//!
//! let flaky = Flaky::new(2, "ready");
//! assert!(Transform::<()>::apply(&flaky, &()).is_failed());
//! assert!(Transform::<()>::apply(&flaky, &()).is_failed());
//! assert!(matches!(Transform::<()>::apply(&flaky, &()), Outcome::Value("ready")));
//! assert_eq!(flaky.calls(), 3);
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use pipewater::{assert_timed_out, assert_yields};
//! use pipewater::retry::TimedOut;
//! use std::time::Duration;
//!
//! let ok: Result<i32, TimedOut> = Ok(42);
//! assert_yields!(ok, 42);
//!
//! let err: Result<i32, TimedOut> = Err(TimedOut::new(
//!     Duration::from_millis(50),
//!     Duration::from_millis(50),
//!     3,
//!     None,
//! ));
//! assert_timed_out!(err, "after 50ms");
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::outcome::{Outcome, TransformError};
use crate::transform::Transform;

/// A transform that fails a fixed number of times, then yields a value.
///
/// Counts every evaluation, so tests can check how many rounds a pipe took.
/// Clones share the counter.
#[derive(Clone)]
pub struct Flaky<T> {
    failures: u32,
    value: T,
    calls: Arc<AtomicU32>,
}

impl<T> Flaky<T> {
    /// Fail `failures` times, then yield `value` on every later call.
    pub fn new(failures: u32, value: T) -> Self {
        Flaky {
            failures,
            value,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Number of evaluations so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T: fmt::Debug> fmt::Debug for Flaky<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flaky")
            .field("failures", &self.failures)
            .field("value", &self.value)
            .field("calls", &self.calls())
            .finish()
    }
}

impl<S: ?Sized, T: Clone + Send + Sync> Transform<S> for Flaky<T> {
    type Output = T;

    fn apply(&self, _subject: &S) -> Outcome<T> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Outcome::Failed(TransformError::new(format!(
                "flaky failure {} of {}",
                call + 1,
                self.failures
            )))
        } else {
            Outcome::Value(self.value.clone())
        }
    }

    fn display_name(&self) -> Option<&str> {
        Some("flaky")
    }
}

/// Assert that a pipe resolved to the expected value.
///
/// This macro will panic if the pipe timed out or yielded something else.
///
/// # Example
///
/// ```rust
/// use pipewater::{assert_yields, retry::TimedOut};
///
/// let result: Result<&str, TimedOut> = Ok("bar");
/// assert_yields!(result, "bar");
/// ```
#[macro_export]
macro_rules! assert_yields {
    ($result:expr, $expected:expr) => {
        match $result {
            Ok(value) => assert_eq!(value, $expected),
            Err(e) => panic!("Expected pipe to yield {:?}, got: {}", $expected, e),
        }
    };
}

/// Assert that a pipe timed out with a message containing `needle`.
///
/// This macro will panic if the pipe resolved, or if the timeout message
/// does not mention `needle`.
///
/// # Example
///
/// ```rust
/// use pipewater::{assert_timed_out, retry::{Failure, TimedOut}};
/// use pipewater::TransformError;
/// use std::time::Duration;
///
/// let result: Result<(), TimedOut> = Err(TimedOut::new(
///     Duration::from_millis(100),
///     Duration::from_millis(100),
///     5,
///     Some(Failure::Transform(TransformError::new("#wontfind"))),
/// ));
/// assert_timed_out!(result, "#wontfind");
/// ```
#[macro_export]
macro_rules! assert_timed_out {
    ($result:expr, $needle:expr) => {
        match $result {
            Err(e) => {
                let message = e.to_string();
                assert!(
                    message.contains($needle),
                    "Expected timeout mentioning {:?}, got: {}",
                    $needle,
                    message
                );
            }
            Ok(v) => panic!("Expected pipe to time out, got: {:?}", v),
        }
    };
}
