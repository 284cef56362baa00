//! The function a pipe applies to its subject.

use serde::Serialize;

use crate::args::Args;
use crate::loggable::{fn_name, Curried, Loggable};
use crate::outcome::{IntoOutcome, Outcome};

/// Values that can flow through a pipe.
///
/// Subjects and yielded values are cloned into lazily computed console
/// properties and serialized when those are inspected, and they are offered
/// to the host's element probe as `&dyn Any`.
pub trait Subject: Serialize + Clone + Send + Sync + 'static {}

impl<T: Serialize + Clone + Send + Sync + 'static> Subject for T {}

/// A transform from the current subject to a new value.
///
/// Implemented for any `Fn(&S) -> R` where `R` is a `Result` or an
/// [`Outcome`], and for decorated functions ([`Loggable`], [`Curried`]),
/// which additionally report their display name and captured arguments.
///
/// Closures should annotate their parameter (`|s: &Subject| ...`) so they are
/// general over the borrow.
pub trait Transform<S: ?Sized>: Send + Sync {
    /// The value produced by the transform.
    type Output;

    /// Evaluate the transform once against the subject.
    fn apply(&self, subject: &S) -> Outcome<Self::Output>;

    /// Name shown in the command log.
    fn display_name(&self) -> Option<&str> {
        None
    }

    /// Arguments captured when a curried transform was created.
    fn args(&self) -> Option<&Args> {
        None
    }

    /// The command log message: the display name, followed by the formatted
    /// arguments when there are any.
    fn message(&self) -> String {
        match (self.display_name(), self.args()) {
            (name, Some(args)) => format!("{}({})", name.unwrap_or("function"), args),
            (Some(name), None) => name.to_owned(),
            (None, None) => String::new(),
        }
    }
}

impl<S, F, R> Transform<S> for F
where
    S: ?Sized,
    F: Fn(&S) -> R + Send + Sync,
    R: IntoOutcome,
{
    type Output = R::Value;

    fn apply(&self, subject: &S) -> Outcome<R::Value> {
        self(subject).into_outcome()
    }

    fn display_name(&self) -> Option<&str> {
        fn_name::<F>()
    }
}

impl<S, F, R> Transform<S> for Loggable<F>
where
    S: ?Sized,
    F: Fn(&S) -> R + Send + Sync,
    R: IntoOutcome,
{
    type Output = R::Value;

    fn apply(&self, subject: &S) -> Outcome<R::Value> {
        self.call(subject).into_outcome()
    }

    fn display_name(&self) -> Option<&str> {
        Loggable::display_name(self)
    }
}

impl<S, G, R> Transform<S> for Curried<G>
where
    S: ?Sized,
    G: Fn(&S) -> R + Send + Sync,
    R: IntoOutcome,
{
    type Output = R::Value;

    fn apply(&self, subject: &S) -> Outcome<R::Value> {
        self.call(subject).into_outcome()
    }

    fn display_name(&self) -> Option<&str> {
        Curried::display_name(self)
    }

    fn args(&self) -> Option<&Args> {
        Some(Curried::args(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loggable::loggable_named;
    use serde_json::{json, Value};

    fn get_foo(obj: &Value) -> Result<Value, String> {
        Ok(obj["foo"].clone())
    }

    #[test]
    fn test_fn_item_reports_its_name() {
        assert_eq!(Transform::<Value>::display_name(&get_foo), Some("get_foo"));
        assert_eq!(Transform::<Value>::message(&get_foo), "get_foo");
    }

    #[test]
    fn test_closure_has_empty_message() {
        let t = |obj: &Value| Ok::<_, String>(obj["foo"].clone());
        assert_eq!(Transform::<Value>::message(&t), "");
        assert!(matches!(t.apply(&json!({ "foo": 1 })), Outcome::Value(v) if v == json!(1)));
    }

    #[test]
    fn test_curried_message_includes_args() {
        let get_prop = loggable_named("getProp", |prop: &'static str| {
            move |obj: &Value| -> Result<Value, String> { Ok(obj[prop].clone()) }
        });
        let t = get_prop.curry("foo");
        assert_eq!(Transform::<Value>::message(&t), r#"getProp("foo")"#);
        assert!(matches!(t.apply(&json!({ "foo": "bar" })), Outcome::Value(v) if v == "bar"));
    }

    #[test]
    fn test_error_becomes_failed() {
        let t = |_: &Value| Err::<Value, _>("boom");
        assert!(t.apply(&json!(null)).is_failed());
    }
}
