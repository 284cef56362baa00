//! Assertions attached to a pipe.
//!
//! An assertion is checked against every value the transform yields. When it
//! fails, the pipe re-evaluates the transform (after the host's retry delay)
//! instead of failing, until the assertion passes or the timeout elapses.
//!
//! Failure messages follow the familiar `expected <actual> to <verb> <expected>`
//! shape so the final timeout error reads naturally:
//!
//! ```rust
//! use pipewater::assertion::{equal, Assertion};
//!
//! let err = equal("baz").check(&"bar".to_string()).unwrap_err();
//! assert_eq!(err.to_string(), "expected 'bar' to equal 'baz'");
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// The mismatch description produced by a failed assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionError {
    message: String,
}

impl AssertionError {
    /// Create an assertion error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        AssertionError {
            message: message.into(),
        }
    }

    /// The mismatch description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AssertionError {}

/// A check applied to each value a pipe yields.
///
/// Closures of the form `Fn(&T) -> Result<(), AssertionError>` are assertions.
pub trait Assertion<T: ?Sized>: Send + Sync {
    /// Check the value, describing the mismatch on failure.
    fn check(&self, value: &T) -> Result<(), AssertionError>;
}

impl<T, F> Assertion<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Result<(), AssertionError> + Send + Sync,
{
    fn check(&self, value: &T) -> Result<(), AssertionError> {
        self(value)
    }
}

/// Render a value the way assertion messages show it.
///
/// Strings are single-quoted, everything else is compact JSON.
pub fn inspect<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => format!("'{}'", s),
        Ok(other) => other.to_string(),
        Err(_) => "<unserializable>".to_string(),
    }
}

/// Assert that the value equals `expected`. See [`equal`].
#[derive(Debug, Clone)]
pub struct Equal<E> {
    expected: E,
}

/// Assert that the value equals `expected`.
///
/// The value type only needs `PartialEq<E>`, so a `String` subject can be
/// compared against a `&str`.
pub fn equal<E>(expected: E) -> Equal<E> {
    Equal { expected }
}

impl<T, E> Assertion<T> for Equal<E>
where
    T: PartialEq<E> + Serialize + ?Sized,
    E: Serialize + Send + Sync,
{
    fn check(&self, value: &T) -> Result<(), AssertionError> {
        if *value == self.expected {
            Ok(())
        } else {
            Err(AssertionError::new(format!(
                "expected {} to equal {}",
                inspect(value),
                inspect(&self.expected)
            )))
        }
    }
}

/// Assert the length of an array, string or object. See [`have_length`].
#[derive(Debug, Clone, Copy)]
pub struct HaveLength {
    expected: usize,
}

/// Assert that the value has `expected` items (array elements, string
/// characters or object keys).
pub fn have_length(expected: usize) -> HaveLength {
    HaveLength { expected }
}

impl<T: Serialize + ?Sized> Assertion<T> for HaveLength {
    fn check(&self, value: &T) -> Result<(), AssertionError> {
        let actual = match serde_json::to_value(value) {
            Ok(Value::Array(items)) => Some(items.len()),
            Ok(Value::String(s)) => Some(s.chars().count()),
            Ok(Value::Object(map)) => Some(map.len()),
            _ => None,
        };
        match actual {
            Some(n) if n == self.expected => Ok(()),
            Some(n) => Err(AssertionError::new(format!(
                "expected {} to have a length of {} but got {}",
                inspect(value),
                self.expected,
                n
            ))),
            None => Err(AssertionError::new(format!(
                "expected {} to have a length of {} but it has no length",
                inspect(value),
                self.expected
            ))),
        }
    }
}

/// Assert an arbitrary predicate. See [`satisfy`].
pub struct Satisfy<P> {
    description: String,
    predicate: P,
}

/// Assert that `predicate` holds, describing it as `description` on failure.
///
/// ```rust
/// use pipewater::assertion::{satisfy, Assertion};
///
/// let positive = satisfy("be positive", |n: &i32| *n > 0);
/// assert!(positive.check(&3).is_ok());
/// assert_eq!(
///     positive.check(&-1).unwrap_err().to_string(),
///     "expected -1 to be positive"
/// );
/// ```
pub fn satisfy<P>(description: impl Into<String>, predicate: P) -> Satisfy<P> {
    Satisfy {
        description: description.into(),
        predicate,
    }
}

impl<P> fmt::Debug for Satisfy<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Satisfy")
            .field("description", &self.description)
            .finish()
    }
}

impl<T, P> Assertion<T> for Satisfy<P>
where
    T: Serialize + ?Sized,
    P: Fn(&T) -> bool + Send + Sync,
{
    fn check(&self, value: &T) -> Result<(), AssertionError> {
        if (self.predicate)(value) {
            Ok(())
        } else {
            Err(AssertionError::new(format!(
                "expected {} to {}",
                inspect(value),
                self.description
            )))
        }
    }
}
