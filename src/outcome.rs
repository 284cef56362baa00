//! Classification of a transform's result.
//!
//! Every evaluation of a transform produces exactly one [`Outcome`]:
//!
//! - [`Outcome::Value`] - a plain value, known synchronously
//! - [`Outcome::Pending`] - work handed to the host that settles later
//! - [`Outcome::Failed`] - the transform failed; the engine will retry
//!
//! Transforms rarely build an `Outcome` by hand. Returning a `Result` is
//! enough; [`IntoOutcome`] does the classification.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

/// A failure raised while evaluating a transform.
///
/// Transform errors are retryable: the engine records the most recent one and
/// includes its message in the timeout error if the subject never settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    message: String,
}

impl TransformError {
    /// Create a transform error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        TransformError {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransformError {}

/// The result of evaluating a transform once.
pub enum Outcome<T> {
    /// The transform returned a value synchronously.
    Value(T),
    /// The transform issued host work; the value is known once it settles.
    Pending(BoxFuture<'static, Result<T, TransformError>>),
    /// The transform failed.
    Failed(TransformError),
}

impl<T> Outcome<T> {
    /// A synchronously known value.
    pub fn value(value: T) -> Self {
        Outcome::Value(value)
    }

    /// Work that settles later.
    ///
    /// Futures are lazy, so nothing runs until the engine awaits it. That is
    /// what lets the engine take its "before" snapshot first.
    ///
    /// ```rust
    /// use pipewater::Outcome;
    ///
    /// let outcome = Outcome::pending(async { Ok::<_, String>(42) });
    /// assert!(outcome.is_pending());
    /// ```
    pub fn pending<Fut, E>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: 'static,
        E: fmt::Display + 'static,
    {
        Outcome::Pending(
            fut.map(|result| result.map_err(|e| TransformError::new(e.to_string())))
                .boxed(),
        )
    }

    /// A failed evaluation.
    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::Failed(TransformError::new(message))
    }

    /// Returns true if this outcome represents pending host work.
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    /// Returns true if the evaluation failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Outcome::Pending(_) => f.debug_tuple("Pending").field(&"<future>").finish(),
            Outcome::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

/// Conversion from a transform's return type into an [`Outcome`].
pub trait IntoOutcome {
    /// The value type the outcome resolves to.
    type Value;

    /// Classify this result.
    fn into_outcome(self) -> Outcome<Self::Value>;
}

impl<T> IntoOutcome for Outcome<T> {
    type Value = T;

    fn into_outcome(self) -> Outcome<T> {
        self
    }
}

impl<T, E: fmt::Display> IntoOutcome for Result<T, E> {
    type Value = T;

    fn into_outcome(self) -> Outcome<T> {
        match self {
            Ok(value) => Outcome::Value(value),
            Err(e) => Outcome::Failed(TransformError::new(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_is_value() {
        let outcome = Ok::<_, String>(42).into_outcome();
        assert!(matches!(outcome, Outcome::Value(42)));
    }

    #[test]
    fn test_err_is_failed_with_message() {
        let outcome = Err::<i32, _>("cannot read 'bar' of undefined").into_outcome();
        match outcome {
            Outcome::Failed(e) => assert_eq!(e.message(), "cannot read 'bar' of undefined"),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pending_maps_error_to_transform_error() {
        let outcome = Outcome::<i32>::pending(async { Err::<i32, _>("not found: #wontfind") });
        assert!(outcome.is_pending());
        match outcome {
            Outcome::Pending(fut) => {
                assert_eq!(fut.await, Err(TransformError::new("not found: #wontfind")));
            }
            other => panic!("Expected Pending, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_future() {
        let outcome = Outcome::pending(async { Ok::<_, String>(1) });
        assert_eq!(format!("{:?}", outcome), r#"Pending("<future>")"#);
    }
}
