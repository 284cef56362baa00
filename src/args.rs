//! Captured call arguments for diagnostic messages.
//!
//! When a [`Loggable`](crate::Loggable) function is curried, the arguments of the
//! outer call are captured as [`Args`] so the command log can show *which*
//! property, selector or index the inner transform closed over.
//!
//! Arguments are captured structurally: functions become [`Arg::Function`]
//! (carrying their name when one is known), everything else is converted to
//! JSON and stored as [`Arg::Value`].
//!
//! # Examples
//!
//! ```rust
//! use pipewater::args::{func, Arg, ToArgs};
//! use serde_json::json;
//!
//! let args = ("foo", 1, func(|x: i32| x), false, vec![1, 2]).to_args();
//!
//! assert_eq!(args.len(), 5);
//! assert_eq!(args[0], Arg::Value(json!("foo")));
//! assert_eq!(args[2], Arg::Function(None));
//! assert_eq!(args.to_string(), r#""foo", 1, function, false, [1,2]"#);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Deref;

use serde::Serialize;
use serde_json::Value;

use crate::loggable::{fn_name, Curried, Loggable};

/// Serialize for diagnostics, substituting a placeholder on failure.
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|err| Value::String(format!("<unserializable: {}>", err)))
}

/// A single captured argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A plain value, captured as its JSON representation.
    Value(Value),
    /// A function-typed argument, with its display name if it has one.
    Function(Option<String>),
}

impl Arg {
    /// Capture any serializable value.
    ///
    /// Values that fail to serialize are captured as a string placeholder so
    /// diagnostics never abort an invocation.
    pub fn value<T: Serialize + ?Sized>(value: &T) -> Self {
        Arg::Value(to_json(value))
    }

    /// Returns true if this argument is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Arg::Function(_))
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Function(Some(name)) => f.write_str(name),
            Arg::Function(None) => f.write_str("function"),
            Arg::Value(value) => write!(f, "{}", value),
        }
    }
}

/// The ordered argument list of one call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Args(Vec<Arg>);

impl Args {
    /// Create an argument list from captured arguments.
    pub fn new(args: Vec<Arg>) -> Self {
        Args(args)
    }

    /// Consume the list, returning the captured arguments.
    pub fn into_vec(self) -> Vec<Arg> {
        self.0
    }

    /// JSON rendering used in console properties.
    ///
    /// Functions become their name (or `"function"`) since JSON has no
    /// function type.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|arg| match arg {
                    Arg::Value(value) => value.clone(),
                    Arg::Function(_) => Value::String(arg.to_string()),
                })
                .collect(),
        )
    }
}

impl Deref for Args {
    type Target = [Arg];

    fn deref(&self) -> &[Arg] {
        &self.0
    }
}

impl From<Vec<Arg>> for Args {
    fn from(args: Vec<Arg>) -> Self {
        Args(args)
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        Ok(())
    }
}

/// Conversion of one argument into its captured form.
pub trait ToArg {
    /// Capture this value as an [`Arg`].
    fn to_arg(&self) -> Arg;
}

macro_rules! serialize_to_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> Arg {
                    Arg::value(self)
                }
            }
        )*
    };
}

serialize_to_arg!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, str,
    String, Value,
);

impl<T: Serialize> ToArg for Vec<T> {
    fn to_arg(&self) -> Arg {
        Arg::value(self)
    }
}

impl<T: Serialize> ToArg for [T] {
    fn to_arg(&self) -> Arg {
        Arg::value(self)
    }
}

impl<T: Serialize, const N: usize> ToArg for [T; N] {
    fn to_arg(&self) -> Arg {
        Arg::value(&self[..])
    }
}

impl<T: Serialize> ToArg for Option<T> {
    fn to_arg(&self) -> Arg {
        Arg::value(self)
    }
}

impl<V: Serialize> ToArg for BTreeMap<String, V> {
    fn to_arg(&self) -> Arg {
        Arg::value(self)
    }
}

impl<V: Serialize> ToArg for HashMap<String, V> {
    fn to_arg(&self) -> Arg {
        Arg::value(self)
    }
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Arg {
        (**self).to_arg()
    }
}

impl<F> ToArg for Loggable<F> {
    fn to_arg(&self) -> Arg {
        Arg::Function(self.display_name().map(str::to_owned))
    }
}

impl<F> ToArg for Curried<F> {
    fn to_arg(&self) -> Arg {
        Arg::Function(self.display_name().map(str::to_owned))
    }
}

/// A function passed as an argument to a curried [`Loggable`].
///
/// Created by [`func`]. Derefs to the wrapped function so the callee can
/// still call it.
#[derive(Clone, Copy)]
pub struct FnArg<F>(pub F);

/// Mark a function argument so it is captured as [`Arg::Function`].
///
/// Named functions (`fn` items) keep their name; closures are anonymous.
pub fn func<F>(f: F) -> FnArg<F> {
    FnArg(f)
}

impl<F> Deref for FnArg<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.0
    }
}

impl<F> fmt::Debug for FnArg<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnArg")
            .field(&fn_name::<F>().unwrap_or("function"))
            .finish()
    }
}

impl<F> ToArg for FnArg<F> {
    fn to_arg(&self) -> Arg {
        Arg::Function(fn_name::<F>().map(str::to_owned))
    }
}

/// Conversion of a whole call's arguments into [`Args`].
///
/// Implemented for every single [`ToArg`] value and for tuples of up to eight
/// of them, so `getter.curry("foo")` and `getter.curry(("foo", 1))` both work.
pub trait ToArgs {
    /// Capture these arguments.
    fn to_args(&self) -> Args;
}

impl<T: ToArg + ?Sized> ToArgs for T {
    fn to_args(&self) -> Args {
        Args(vec![self.to_arg()])
    }
}

impl ToArgs for () {
    fn to_args(&self) -> Args {
        Args::default()
    }
}

macro_rules! tuple_to_args {
    ($($name:ident),+) => {
        impl<$($name: ToArg),+> ToArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_args(&self) -> Args {
                let ($($name,)+) = self;
                Args(vec![$($name.to_arg()),+])
            }
        }
    };
}

tuple_to_args!(A);
tuple_to_args!(A, B);
tuple_to_args!(A, B, C);
tuple_to_args!(A, B, C, D);
tuple_to_args!(A, B, C, D, E);
tuple_to_args!(A, B, C, D, E, F);
tuple_to_args!(A, B, C, D, E, F, G);
tuple_to_args!(A, B, C, D, E, F, G, H);
