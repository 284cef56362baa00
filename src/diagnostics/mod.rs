//! Diagnostic records for the command log.
//!
//! Each logged pipe invocation opens one record through the host's
//! [`open_log`](crate::host::Host::open_log), updates it as values become known,
//! takes snapshots of the state around the transform and ends it exactly once.
//!
//! - [`LogAttrs`] - what a record is opened with
//! - [`LogUpdate`] - changes applied while the invocation runs
//! - [`LogHandle`] - the host-side record
//! - [`ConsoleProps`] - lazily computed details for inspection
//! - [`LogBook`] / [`MemoryLog`] - an in-memory backend used by
//!   [`TokioHost`](crate::host::TokioHost)

mod memory;
pub(crate) mod session;

pub use memory::{LogBook, LogRecord, MemoryLog};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attributes a record is opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogAttrs {
    /// The command name (`"pipe"`).
    pub name: String,
    /// Human-readable message, usually the transform's name and arguments.
    pub message: String,
}

/// A change to an open record.
#[derive(Debug, Clone)]
pub enum LogUpdate {
    /// The element the command is centered on.
    Element(Value),
    /// Details shown when the record is inspected.
    ConsoleProps(ConsoleProps),
}

/// A state capture attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot name (`"before"`, `"after"`), or `None` for a single capture.
    pub name: Option<String>,
    /// Name of the snapshot expected to follow this one.
    pub next: Option<String>,
    /// The record's element at the time of capture.
    pub element: Option<Value>,
}

/// The host-side handle of one diagnostic record.
pub trait LogHandle: Send {
    /// Apply an update.
    fn set(&mut self, update: LogUpdate);

    /// Capture the current state.
    fn snapshot(&mut self, name: Option<&str>, next: Option<&str>);

    /// Finish the record. Called exactly once per invocation.
    fn end(&mut self);
}

type PropsFn = dyn Fn() -> Map<String, Value> + Send + Sync;

/// Console properties computed on demand.
///
/// Building the map means serializing subjects and yielded values, so the
/// engine hands the host a closure and only pays when someone looks.
#[derive(Clone)]
pub struct ConsoleProps(Arc<PropsFn>);

impl ConsoleProps {
    /// Wrap a closure producing the properties.
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> Map<String, Value> + Send + Sync + 'static,
    {
        ConsoleProps(Arc::new(f))
    }

    /// Compute the properties.
    pub fn resolve(&self) -> Map<String, Value> {
        (self.0)()
    }
}

impl fmt::Debug for ConsoleProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConsoleProps").field(&"<lazy>").finish()
    }
}
