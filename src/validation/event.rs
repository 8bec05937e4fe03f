//! Validation events and their delivery channel.
//!
//! Every reportable condition a [`crate::validation::ValidationSession`] detects
//! funnels through one [`EventHandler`]. The handler decides per event whether the
//! session continues (`Ok(true)`) or aborts; both `Ok(false)` and `Err(_)` reject the
//! report and unwind the session.

use std::fmt;
use std::sync::Mutex;

use crate::Result;

/// Severity of a validation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The condition is suspicious but does not invalidate the graph.
    Warning,
    /// The condition invalidates the graph.
    Error,
}

/// The condition a validation event reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The same object was reached again on the current traversal.
    CycleDetected,
    /// The same identifier value was declared by more than one object.
    DuplicateId(String),
    /// An identifier was referenced but never declared anywhere in the graph.
    IdNotFound(String),
}

impl EventKind {
    /// Default severity of this condition.
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::Error
    }

    fn render(&self) -> String {
        match self {
            EventKind::CycleDetected => "cycle detected in the object graph".to_string(),
            EventKind::DuplicateId(value) => {
                format!("identifier `{value}` declared more than once")
            }
            EventKind::IdNotFound(value) => {
                format!("identifier `{value}` is referenced but never declared")
            }
        }
    }
}

/// One reportable condition, attributed to the object that caused it.
#[derive(Debug, Clone)]
pub struct ValidationEvent {
    /// Event severity.
    pub severity: Severity,
    /// The detected condition.
    pub kind: EventKind,
    /// Type name of the object the condition is attributed to.
    pub source: String,
    /// Human-readable rendering of the condition.
    pub message: String,
}

impl ValidationEvent {
    pub(crate) fn new(kind: EventKind, source: &str) -> Self {
        ValidationEvent {
            severity: kind.severity(),
            message: kind.render(),
            kind,
            source: source.to_string(),
        }
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.severity, self.source, self.message)
    }
}

/// Receiver of validation events.
///
/// `Ok(true)` accepts the event and lets the session continue; `Ok(false)` rejects it;
/// a returned error is treated exactly like a rejection. After the first rejection the
/// session aborts and delivers nothing further.
pub trait EventHandler: Send + Sync {
    /// Handle one event, deciding whether the session continues.
    fn handle(&self, event: &ValidationEvent) -> Result<bool>;
}

/// Handler that accepts and records every event, for batch-style validation.
#[derive(Default)]
pub struct CollectingHandler {
    events: Mutex<Vec<ValidationEvent>>,
}

impl CollectingHandler {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        CollectingHandler::default()
    }

    /// Snapshot of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ValidationEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventHandler for CollectingHandler {
    fn handle(&self, event: &ValidationEvent) -> Result<bool> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_rendering() {
        let event = ValidationEvent::new(EventKind::DuplicateId("n1".to_string()), "demo.Node");
        assert_eq!(event.severity, Severity::Error);
        assert!(event.message.contains("n1"));
        assert_eq!(event.source, "demo.Node");
    }

    #[test]
    fn test_collecting_handler_accepts_everything() {
        let handler = CollectingHandler::new();
        let event = ValidationEvent::new(EventKind::CycleDetected, "demo.Node");
        assert!(handler.handle(&event).unwrap());
        assert!(handler.handle(&event).unwrap());
        assert_eq!(handler.events().len(), 2);
    }
}
