//! # Pipewater
//!
//! > *"Keep the water moving until it runs clear"*
//!
//! Retry-until-settled value transformation for end-to-end test runners.
//!
//! ## Philosophy
//!
//! A pipe takes a subject, applies a function to it and keeps re-applying it
//! until the result is what the test expects:
//! - **Errors are signals**: a failing transform means "not yet", not "stop"
//! - **Assertions drive retries**: a value the assertion rejects is retried too
//! - **Time-bounded**: one fixed timeout per invocation, never extended
//! - **Diagnosable**: every invocation leaves exactly one finished log record
//!
//! The runner-specific parts (timers, log storage, element detection) sit
//! behind the [`Host`] trait. [`TokioHost`] is a complete implementation.
//!
//! ## Quick Example
//!
//! ```rust
//! use pipewater::prelude::*;
//! use serde_json::{json, Value};
//!
//! # tokio_test::block_on(async {
//! let host = TokioHost::default();
//!
//! // Display name and arguments end up in the command log
//! let get_prop = loggable_named("getProp", |prop: &'static str| {
//!     move |obj: &Value| obj.get(prop).cloned().ok_or("missing")
//! });
//!
//! let bar = Chain::wrap(&host, json!({ "foo": "bar" }))
//!     .pipe(get_prop.curry("foo"))
//!     .should(equal(json!("bar")))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(bar.into_subject(), json!("bar"));
//! assert_eq!(host.logs().last().unwrap().message(), r#"getProp("foo")"#);
//! # });
//! ```
//!
//! For more, see the `demos/` directory.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod args;
pub mod assertion;
pub mod diagnostics;
pub mod host;
pub mod loggable;
pub mod outcome;
pub mod retry;
pub mod testing;
pub mod transform;

mod chain;

pub use chain::{Chain, PipeCommand};
pub use host::{Host, HostConfig, RetryState};
#[cfg(feature = "async")]
pub use host::TokioHost;
pub use loggable::{loggable, loggable_named, ArgumentError, Curried, Loggable};
pub use outcome::{Outcome, TransformError};
pub use retry::{pipe, BackoffPolicy, Failure, PipeOptions, TimedOut};
pub use transform::{Subject, Transform};

/// Prelude module for convenient imports.
///
/// ```rust
/// use pipewater::prelude::*;
/// ```
pub mod prelude {
    pub use crate::args::func;
    pub use crate::assertion::{equal, have_length, satisfy, Assertion, AssertionError};
    pub use crate::chain::{Chain, PipeCommand};
    pub use crate::host::{Host, HostConfig};
    #[cfg(feature = "async")]
    pub use crate::host::TokioHost;
    pub use crate::loggable::{loggable, loggable_named, Curried, Loggable};
    pub use crate::outcome::{IntoOutcome, Outcome, TransformError};
    pub use crate::retry::{pipe, BackoffPolicy, Failure, PipeOptions, TimedOut};
    pub use crate::transform::{Subject, Transform};
}
