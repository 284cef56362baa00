//! Function decoration for readable command logs.
//!
//! Transforms handed to [`pipe`](crate::pipe) are often curried: a factory
//! takes a property name or selector and returns the function that actually
//! reads the subject. Without help the inner function is anonymous and the
//! command log cannot say which property it reads.
//!
//! [`Loggable`] fixes that. It carries a display name and, when curried with
//! [`Loggable::curry`], hands back a [`Curried`] function that inherits the
//! name and remembers the exact arguments of that call.
//!
//! # Example
//!
//! ```rust
//! use pipewater::loggable_named;
//! use serde_json::{json, Value};
//!
//! let get_prop = loggable_named("getProp", |prop: &'static str| {
//!     move |obj: &Value| obj[prop].clone()
//! });
//!
//! let get_foo = get_prop.curry("foo");
//!
//! assert_eq!(get_foo.display_name(), Some("getProp"));
//! assert_eq!(get_foo.message(), r#"getProp("foo")"#);
//! assert_eq!(get_foo.call(&json!({ "foo": "bar" })), json!("bar"));
//! ```
//!
//! Each curried function owns its captured arguments, so two calls of the
//! same decorated factory never overwrite each other's metadata.

use std::any::type_name;
use std::fmt;

use serde_json::Value;

use crate::args::{Args, ToArgs};

/// Best-effort name of a function type.
///
/// `fn` items report the last segment of their path; closures, function
/// pointers and other unnamed callables report `None`.
pub(crate) fn fn_name<F: ?Sized>() -> Option<&'static str> {
    let path = type_name::<F>();
    if path.contains("{{closure}}") || path.contains('(') || path.starts_with('&') {
        return None;
    }
    let path = path.split('<').next().unwrap_or(path);
    let name = path.rsplit("::").next().unwrap_or(path);
    let is_ident = !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    is_ident.then_some(name)
}

/// Error returned when a decorator is given something other than a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    found: String,
}

impl ArgumentError {
    /// The JSON rendering of the rejected argument.
    pub fn found(&self) -> &str {
        &self.found
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "First argument must be a function or string (got {})",
            self.found
        )
    }
}

impl std::error::Error for ArgumentError {}

/// A function decorated with a display name.
///
/// Calling it with [`call`](Self::call) behaves exactly like calling the
/// wrapped function. Calling it with [`curry`](Self::curry) does the same but
/// stamps the returned function with this display name and the arguments
/// used.
#[derive(Clone)]
pub struct Loggable<F> {
    func: F,
    display_name: Option<String>,
}

/// Decorate a function, naming it after the function itself.
///
/// `fn` items keep their own name; closures stay anonymous until curried
/// through a named decorator.
///
/// ```rust
/// use pipewater::loggable;
///
/// fn get_foo(obj: &serde_json::Value) -> serde_json::Value {
///     obj["foo"].clone()
/// }
///
/// assert_eq!(loggable(get_foo).display_name(), Some("get_foo"));
/// assert_eq!(loggable(|x: i32| x).display_name(), None);
/// ```
pub fn loggable<F>(func: F) -> Loggable<F> {
    Loggable::new(func)
}

/// Decorate a function with an explicit display name.
///
/// The explicit name overrides whatever name the function already had.
pub fn loggable_named<F>(name: impl Into<String>, func: F) -> Loggable<F> {
    Loggable::named(name, func)
}

impl<F> Loggable<F> {
    /// Decorate `func`, naming it after the function itself.
    pub fn new(func: F) -> Self {
        Loggable {
            display_name: fn_name::<F>().map(str::to_owned),
            func,
        }
    }

    /// Decorate `func` with an explicit display name.
    pub fn named(name: impl Into<String>, func: F) -> Self {
        Loggable {
            func,
            display_name: Some(name.into()),
        }
    }

    /// Decorate from an untyped leading argument.
    ///
    /// Hosts that forward decorator calls from a scripting layer pass the
    /// optional leading name through as JSON. `None` means the function was
    /// the first argument; a JSON string names it; anything else is rejected.
    ///
    /// ```rust
    /// use pipewater::Loggable;
    /// use serde_json::json;
    ///
    /// let named = Loggable::decorate(Some(json!("getFoo")), |x: i32| x).unwrap();
    /// assert_eq!(named.display_name(), Some("getFoo"));
    ///
    /// let err = Loggable::decorate(Some(json!(42)), |x: i32| x).unwrap_err();
    /// assert!(err.to_string().contains("must be a function or string"));
    /// ```
    pub fn decorate(name: Option<Value>, func: F) -> Result<Self, ArgumentError> {
        match name {
            None => Ok(Loggable::new(func)),
            Some(Value::String(name)) => Ok(Loggable::named(name, func)),
            Some(other) => Err(ArgumentError {
                found: other.to_string(),
            }),
        }
    }

    /// The display name shown in the command log.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Get a reference to the wrapped function.
    pub fn inner(&self) -> &F {
        &self.func
    }

    /// Unwrap the decorator.
    pub fn into_inner(self) -> F {
        self.func
    }

    /// Call the wrapped function, returning its result unchanged.
    pub fn call<A, R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
    {
        (self.func)(args)
    }

    /// Call a curried function and stamp the function it returns.
    ///
    /// The returned [`Curried`] inherits this display name (falling back to
    /// the inner function's own name) and records `args` exactly as passed.
    /// Pass several arguments as a tuple.
    ///
    /// Only one level is instrumented: calling the [`Curried`] result returns
    /// whatever the inner function returns, unstamped.
    pub fn curry<A, G>(&self, args: A) -> Curried<G>
    where
        F: Fn(A) -> G,
        A: ToArgs,
    {
        let captured = args.to_args();
        let func = (self.func)(args);
        Curried {
            display_name: self
                .display_name
                .clone()
                .or_else(|| fn_name::<G>().map(str::to_owned)),
            args: captured,
            func,
        }
    }
}

impl<F> fmt::Debug for Loggable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loggable")
            .field("display_name", &self.display_name)
            .field("func", &"<function>")
            .finish()
    }
}

/// The function returned by a curried [`Loggable`], stamped with metadata.
#[derive(Clone)]
pub struct Curried<G> {
    func: G,
    display_name: Option<String>,
    args: Args,
}

impl<G> Curried<G> {
    /// The display name inherited from the decorator.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The arguments of the call that produced this function.
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Command log message: the display name followed by the formatted
    /// arguments, e.g. `getProp("foo", 1)`.
    pub fn message(&self) -> String {
        format!(
            "{}({})",
            self.display_name.as_deref().unwrap_or("function"),
            self.args
        )
    }

    /// Call the stamped function.
    pub fn call<A, R>(&self, args: A) -> R
    where
        G: Fn(A) -> R,
    {
        (self.func)(args)
    }

    /// Get a reference to the stamped function.
    pub fn inner(&self) -> &G {
        &self.func
    }
}

impl<G> fmt::Debug for Curried<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curried")
            .field("display_name", &self.display_name)
            .field("args", &self.args)
            .finish()
    }
}
