//! Retrying a transform until its result settles.
//!
//! A pipe is bounded by time, not by attempt count. Each invocation gets one
//! fixed timeout, from [`PipeOptions`] or the host's default, and keeps
//! re-evaluating its transform until a value passes the caller's assertion
//! or that budget runs out.
//!
//! - **Policy is data**: [`BackoffPolicy`] only describes the wait between
//!   rounds; the host does the waiting
//! - **Errors are retryable**: a failing transform and a rejected value both
//!   lead to another round
//! - **One timeout error**: [`TimedOut`] carries the last [`Failure`]
//!
//! # Quick Start
//!
//! ```rust
//! use pipewater::{pipe, PipeOptions, TokioHost};
//! use pipewater::assertion::equal;
//! use serde_json::{json, Value};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let host = TokioHost::default();
//! let should = equal(json!("baz"));
//!
//! let err = pipe(
//!     &host,
//!     json!({ "foo": "bar" }),
//!     |obj: &Value| Ok::<_, String>(obj["foo"].clone()),
//!     PipeOptions::new().with_timeout(Duration::from_millis(50)),
//!     Some(&should),
//! )
//! .await
//! .unwrap_err();
//!
//! assert_eq!(
//!     err.to_string(),
//!     "Timed out retrying after 50ms: expected 'bar' to equal 'baz'"
//! );
//! # });
//! ```

mod engine;
mod error;
mod options;
mod policy;

pub use engine::pipe;
pub use error::{Failure, TimedOut};
pub use options::PipeOptions;
pub use policy::{BackoffPolicy, BackoffStrategy, DEFAULT_RETRY_INTERVAL};
