//! Scoped ownership of one invocation's diagnostic record.

use serde_json::Value;

use super::{ConsoleProps, LogHandle, LogUpdate};

/// Owns the record of a single pipe invocation and guarantees it is ended
/// exactly once, on success, on timeout and when the invocation's future is
/// dropped mid-flight.
pub(crate) struct DiagnosticSession<L: LogHandle> {
    log: Option<L>,
    took_pending: bool,
    ended: bool,
}

impl<L: LogHandle> DiagnosticSession<L> {
    /// `None` disables logging; every method becomes a no-op.
    pub(crate) fn new(log: Option<L>) -> Self {
        DiagnosticSession {
            log,
            took_pending: false,
            ended: false,
        }
    }

    pub(crate) fn is_logging(&self) -> bool {
        self.log.is_some()
    }

    pub(crate) fn set_element(&mut self, element: Value) {
        if let Some(log) = self.log.as_mut() {
            log.set(LogUpdate::Element(element));
        }
    }

    /// Called right before pending host work is awaited. Only the first
    /// pending evaluation captures the "before" state.
    pub(crate) fn before_pending(&mut self) {
        if self.took_pending {
            return;
        }
        self.took_pending = true;
        if let Some(log) = self.log.as_mut() {
            log.snapshot(Some("before"), Some("after"));
        }
    }

    /// Record a resolved value. Values that settled from pending work also
    /// get their "after" snapshot here.
    pub(crate) fn record_yield(
        &mut self,
        props: ConsoleProps,
        element: Option<Value>,
        settled_from_pending: bool,
    ) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        if let Some(element) = element {
            log.set(LogUpdate::Element(element));
        }
        log.set(LogUpdate::ConsoleProps(props));
        if settled_from_pending {
            log.snapshot(Some("after"), None);
        }
    }

    pub(crate) fn finish(mut self) {
        self.end();
    }

    fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        if let Some(log) = self.log.as_mut() {
            if !self.took_pending {
                log.snapshot(None, None);
            }
            log.end();
        }
    }
}

impl<L: LogHandle> Drop for DiagnosticSession<L> {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{LogAttrs, LogBook};
    use serde_json::{json, Map};

    fn open(book: &LogBook) -> DiagnosticSession<crate::diagnostics::MemoryLog> {
        DiagnosticSession::new(Some(book.open(LogAttrs {
            name: "pipe".into(),
            message: String::new(),
        })))
    }

    fn props() -> ConsoleProps {
        ConsoleProps::lazy(Map::new)
    }

    #[test]
    fn test_sync_session_takes_one_terminal_snapshot() {
        let book = LogBook::new();
        let mut session = open(&book);
        session.record_yield(props(), None, false);
        session.record_yield(props(), None, false);
        session.finish();

        let record = book.last().unwrap();
        assert_eq!(record.snapshots.len(), 1);
        assert_eq!(record.snapshots[0].name, None);
        assert_eq!(record.end_count, 1);
    }

    #[test]
    fn test_pending_session_takes_before_and_after() {
        let book = LogBook::new();
        let mut session = open(&book);
        session.before_pending();
        session.record_yield(props(), Some(json!(["#first"])), true);
        session.before_pending();
        session.record_yield(props(), Some(json!(["#first"])), true);
        session.finish();

        let record = book.last().unwrap();
        let names: Vec<_> = record
            .snapshots
            .iter()
            .map(|s| s.name.as_deref())
            .collect();
        assert_eq!(names, vec![Some("before"), Some("after")]);
        assert_eq!(record.snapshots[1].element, Some(json!(["#first"])));
        assert_eq!(record.end_count, 1);
    }

    #[test]
    fn test_drop_ends_once() {
        let book = LogBook::new();
        {
            let _session = open(&book);
        }
        assert_eq!(book.last().unwrap().end_count, 1);
    }

    #[test]
    fn test_disabled_session_is_silent() {
        let book = LogBook::new();
        let mut session: DiagnosticSession<crate::diagnostics::MemoryLog> =
            DiagnosticSession::new(None);
        assert!(!session.is_logging());
        session.before_pending();
        session.record_yield(props(), None, true);
        session.finish();
        assert!(book.is_empty());
    }
}
