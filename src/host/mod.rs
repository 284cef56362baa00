//! The test runner a pipe plugs into.
//!
//! The retry engine owns no timers and no log storage. It borrows them from a
//! [`Host`]: the host decides how long to wait between rounds and when the
//! budget is spent, verifies assertions, stores diagnostic records and tells
//! element collections apart from plain values.
//!
//! [`TokioHost`] is a complete host built on tokio timers and an in-memory
//! [`LogBook`](crate::diagnostics::LogBook).

mod config;
#[cfg(feature = "async")]
mod tokio_host;

pub use config::HostConfig;
#[cfg(feature = "async")]
pub use tokio_host::{ElementProbe, TokioHost};

use std::any::Any;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;

use crate::assertion::{Assertion, AssertionError};
use crate::diagnostics::{LogAttrs, LogHandle};
use crate::outcome::TransformError;
use crate::retry::{Failure, TimedOut};

/// Progress of one invocation, handed to [`Host::retry_after_delay`] and
/// [`Host::settle`].
#[derive(Debug, Clone)]
pub struct RetryState {
    started: Instant,
    timeout: Duration,
    attempts: u32,
    last_error: Option<Failure>,
}

impl RetryState {
    /// Start tracking an invocation that began at `started`.
    pub fn new(started: Instant, timeout: Duration) -> Self {
        RetryState {
            started,
            timeout,
            attempts: 0,
            last_error: None,
        }
    }

    /// When the invocation began.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time since the invocation began.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The invocation's fixed timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Evaluations made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Zero-indexed number of the retry about to be scheduled.
    pub fn retry_index(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// The failure of the latest round.
    pub fn last_error(&self) -> Option<&Failure> {
        self.last_error.as_ref()
    }

    /// The error to surface when the budget is spent.
    pub fn timed_out(&self) -> TimedOut {
        TimedOut::new(
            self.timeout,
            self.elapsed(),
            self.attempts,
            self.last_error.clone(),
        )
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub(crate) fn record_failure(&mut self, failure: Failure) {
        self.last_error = Some(failure);
    }
}

/// Capabilities the retry engine needs from its test runner.
pub trait Host: Send + Sync {
    /// Handle of an open diagnostic record.
    type Log: LogHandle;

    /// Timeout used when the invocation does not set one.
    fn default_timeout(&self) -> Duration;

    /// Open a diagnostic record.
    fn open_log(&self, attrs: LogAttrs) -> Self::Log;

    /// `Some(count)` if `value` is an element collection.
    ///
    /// Element collections get their element count in the console
    /// properties and become the record's element.
    fn element_count(&self, value: &dyn Any) -> Option<usize> {
        let _ = value;
        None
    }

    /// Wait before the next round, or fail with [`TimedOut`] if the budget
    /// cannot cover another one.
    fn retry_after_delay(
        &self,
        state: &RetryState,
    ) -> impl Future<Output = Result<(), TimedOut>> + Send;

    /// Drive the pending work of one round to completion.
    ///
    /// The work must not outlive the invocation's budget: once
    /// `state.timeout()` has elapsed since `state.started()`, resolve to
    /// `Err(state.timed_out())` and drop the work.
    fn settle<T>(
        &self,
        state: &RetryState,
        work: BoxFuture<'static, Result<T, TransformError>>,
    ) -> impl Future<Output = Result<Result<T, TransformError>, TimedOut>> + Send
    where
        T: Send + 'static;

    /// Apply the caller's pending assertion to a resolved value.
    ///
    /// A rejection sends the engine into another round; the default runs the
    /// assertion directly and passes when there is none.
    fn verify_assertions<T>(
        &self,
        value: &T,
        assertion: Option<&dyn Assertion<T>>,
    ) -> impl Future<Output = Result<(), AssertionError>> + Send
    where
        T: Sync + ?Sized,
    {
        let verdict = match assertion {
            Some(assertion) => assertion.check(value),
            None => Ok(()),
        };
        std::future::ready(verdict)
    }
}
