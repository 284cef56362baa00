//! In-memory diagnostic records.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Value};

use super::{ConsoleProps, LogAttrs, LogHandle, LogUpdate, Snapshot};

/// One diagnostic record as stored by a [`LogBook`].
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Attributes the record was opened with.
    pub attrs: LogAttrs,
    /// The element the command is centered on, if any.
    pub element: Option<Value>,
    /// Lazily computed console properties.
    pub console_props: Option<ConsoleProps>,
    /// Snapshots in the order they were taken.
    pub snapshots: Vec<Snapshot>,
    /// Number of updates applied after opening.
    pub changes: u32,
    /// Number of times the record was ended.
    pub end_count: u32,
}

impl LogRecord {
    fn open(attrs: LogAttrs) -> Self {
        LogRecord {
            attrs,
            element: None,
            console_props: None,
            snapshots: Vec::new(),
            changes: 0,
            end_count: 0,
        }
    }

    /// The command name.
    pub fn name(&self) -> &str {
        &self.attrs.name
    }

    /// The log message.
    pub fn message(&self) -> &str {
        &self.attrs.message
    }

    /// Returns true once the record has been ended.
    pub fn is_ended(&self) -> bool {
        self.end_count > 0
    }

    /// Resolve the console properties, if any were set.
    pub fn resolve_console_props(&self) -> Option<Map<String, Value>> {
        self.console_props.as_ref().map(ConsoleProps::resolve)
    }
}

/// A shared, append-only collection of diagnostic records.
///
/// Cloning a `LogBook` yields another handle to the same records.
///
/// ```rust
/// use pipewater::diagnostics::{LogAttrs, LogBook, LogHandle};
///
/// let book = LogBook::new();
/// let mut log = book.open(LogAttrs { name: "pipe".into(), message: "getFoo".into() });
/// log.snapshot(None, None);
/// log.end();
///
/// let record = book.last().unwrap();
/// assert_eq!(record.message(), "getFoo");
/// assert_eq!(record.snapshots.len(), 1);
/// assert!(record.is_ended());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogBook {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogBook {
    /// Create an empty log book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new record.
    pub fn open(&self, attrs: LogAttrs) -> MemoryLog {
        #[cfg(feature = "tracing")]
        tracing::trace!(name = %attrs.name, message = %attrs.message, "log opened");

        let mut records = self.lock();
        records.push(LogRecord::open(attrs));
        MemoryLog {
            book: self.clone(),
            index: records.len() - 1,
        }
    }

    /// A copy of every record, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Records opened with the given command name.
    pub fn named(&self, name: &str) -> Vec<LogRecord> {
        self.lock()
            .iter()
            .filter(|r| r.name() == name)
            .cloned()
            .collect()
    }

    /// The most recently opened record.
    pub fn last(&self) -> Option<LogRecord> {
        self.lock().last().cloned()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no record was opened.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_record(&self, index: usize, f: impl FnOnce(&mut LogRecord)) {
        if let Some(record) = self.lock().get_mut(index) {
            f(record);
        }
    }
}

/// Handle to one record in a [`LogBook`].
#[derive(Debug)]
pub struct MemoryLog {
    book: LogBook,
    index: usize,
}

impl LogHandle for MemoryLog {
    fn set(&mut self, update: LogUpdate) {
        self.book.with_record(self.index, |record| {
            record.changes += 1;
            match update {
                LogUpdate::Element(element) => record.element = Some(element),
                LogUpdate::ConsoleProps(props) => record.console_props = Some(props),
            }
        });
    }

    /// Snapshots are keyed by name: a named snapshot taken again replaces the
    /// earlier capture, so retried pending work keeps one "after" state.
    fn snapshot(&mut self, name: Option<&str>, next: Option<&str>) {
        #[cfg(feature = "tracing")]
        tracing::trace!(index = self.index, name = ?name, "snapshot taken");

        self.book.with_record(self.index, |record| {
            let snapshot = Snapshot {
                name: name.map(str::to_owned),
                next: next.map(str::to_owned),
                element: record.element.clone(),
            };
            let existing = name.and_then(|name| {
                record
                    .snapshots
                    .iter_mut()
                    .find(|s| s.name.as_deref() == Some(name))
            });
            match existing {
                Some(slot) => *slot = snapshot,
                None => record.snapshots.push(snapshot),
            }
        });
    }

    fn end(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::trace!(index = self.index, "log ended");

        self.book
            .with_record(self.index, |record| record.end_count += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(message: &str) -> LogAttrs {
        LogAttrs {
            name: "pipe".into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_records_are_shared_between_clones() {
        let book = LogBook::new();
        let other = book.clone();
        let _log = book.open(attrs("a"));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_set_tracks_element_and_changes() {
        let book = LogBook::new();
        let mut log = book.open(attrs("a"));
        log.set(LogUpdate::Element(json!(["#first"])));

        let record = book.last().unwrap();
        assert_eq!(record.element, Some(json!(["#first"])));
        assert_eq!(record.changes, 1);
    }

    #[test]
    fn test_named_snapshot_replaces_previous() {
        let book = LogBook::new();
        let mut log = book.open(attrs("a"));
        log.snapshot(Some("before"), Some("after"));
        log.set(LogUpdate::Element(json!(1)));
        log.snapshot(Some("after"), None);
        log.set(LogUpdate::Element(json!(2)));
        log.snapshot(Some("after"), None);

        let snapshots = book.last().unwrap().snapshots;
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].name.as_deref(), Some("before"));
        assert_eq!(snapshots[0].next.as_deref(), Some("after"));
        assert_eq!(snapshots[1].element, Some(json!(2)));
    }

    #[test]
    fn test_unnamed_snapshots_accumulate() {
        let book = LogBook::new();
        let mut log = book.open(attrs("a"));
        log.snapshot(None, None);
        log.snapshot(None, None);
        assert_eq!(book.last().unwrap().snapshots.len(), 2);
    }

    #[test]
    fn test_named_filters_by_command() {
        let book = LogBook::new();
        let _a = book.open(attrs("a"));
        let _b = book.open(LogAttrs {
            name: "wrap".into(),
            message: String::new(),
        });
        assert_eq!(book.named("pipe").len(), 1);
        book.clear();
        assert!(book.is_empty());
    }
}
