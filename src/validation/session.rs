//! Instance-graph validation sessions.
//!
//! A [`ValidationSession`] drives one depth-first pass over an object graph. The
//! caller supplies an [`InstanceValidator`] that knows how to validate a single
//! object and recurse into its children through [`ValidationSession::validate`]; the
//! session itself contributes the cross-cutting state: reference-identity cycle
//! detection, ID/IDREF bookkeeping, namespace scoping, and event delivery with abort
//! semantics.
//!
//! Identity is the reference, never the value: two structurally equal objects at
//! different addresses are distinct, and the same object reached twice on one pass is
//! a cycle regardless of its content.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    validation::{
        event::{EventHandler, EventKind, ValidationEvent},
        namespace::NamespaceContext,
    },
    Result,
};

/// An object that can take part in a validation pass.
pub trait Validatable: Send + Sync {
    /// Type name used to attribute events to this object.
    fn type_name(&self) -> &str;
}

/// Shared reference to a validatable object. The `Arc`'s data address is the object's
/// identity for cycle detection and IDREF attribution.
pub type ValidatableRc = Arc<dyn Validatable>;

/// Per-type validation logic supplied by the caller.
///
/// `validate` checks one object and recurses into children through the session; it
/// must propagate any error the session returns, since those carry abort semantics.
pub trait InstanceValidator: Send + Sync {
    /// Validate one object, recursing through `session`.
    fn validate(&self, object: &ValidatableRc, session: &mut ValidationSession) -> Result<()>;
}

fn identity_of(object: &ValidatableRc) -> usize {
    Arc::as_ptr(object).cast::<()>() as usize
}

/// One depth-first validation pass over an object graph.
pub struct ValidationSession {
    validator: Arc<dyn InstanceValidator>,
    handler: Arc<dyn EventHandler>,
    visited: HashSet<usize>,
    ids: HashSet<String>,
    idrefs: HashMap<String, ValidatableRc>,
    namespaces: NamespaceContext,
    aborted: bool,
    reported: usize,
}

impl ValidationSession {
    /// Create a session delivering events to `handler` and validating objects with
    /// `validator`.
    #[must_use]
    pub fn new(validator: Arc<dyn InstanceValidator>, handler: Arc<dyn EventHandler>) -> Self {
        ValidationSession {
            validator,
            handler,
            visited: HashSet::new(),
            ids: HashSet::new(),
            idrefs: HashMap::new(),
            namespaces: NamespaceContext::new(),
            aborted: false,
            reported: 0,
        }
    }

    /// Validate `object` and, through the validator, its children.
    ///
    /// An object already visited on this pass is reported as a cycle and not entered
    /// again; the first visit proceeds normally.
    ///
    /// # Errors
    /// [`crate::Error::ValidationAborted`] once the handler rejects any report.
    pub fn validate(&mut self, object: &ValidatableRc) -> Result<()> {
        self.ensure_active()?;
        if !self.visited.insert(identity_of(object)) {
            return self.report(EventKind::CycleDetected, object.type_name());
        }
        let validator = self.validator.clone();
        validator.validate(object, self)
    }

    /// Register an identifier value declared by `owner`.
    ///
    /// A value already declared on this pass is reported as a duplicate, attributed to
    /// the later declarer. The value is returned for chaining.
    pub fn on_id(&mut self, owner: &ValidatableRc, value: String) -> Result<String> {
        self.ensure_active()?;
        if !self.ids.insert(value.clone()) {
            self.report(EventKind::DuplicateId(value.clone()), owner.type_name())?;
        }
        Ok(value)
    }

    /// Register a reference made by `referer` to an identifier declared elsewhere.
    ///
    /// References are not checked here; [`ValidationSession::reconcile_ids`] resolves
    /// them once the whole graph has been seen. When the same value is referenced
    /// repeatedly, an eventual not-found event is attributed to the first referer.
    pub fn on_idref(&mut self, referer: &ValidatableRc, value: String) -> Result<String> {
        self.ensure_active()?;
        if !self.ids.contains(&value) {
            self.idrefs
                .entry(value.clone())
                .or_insert_with(|| referer.clone());
        }
        Ok(value)
    }

    /// Resolve all collected references against all collected declarations, reporting
    /// one not-found event per unresolved value.
    ///
    /// The pending references are consumed up front, so a second reconciliation after
    /// an accepted pass reports nothing.
    pub fn reconcile_ids(&mut self) -> Result<()> {
        self.ensure_active()?;
        let pending = std::mem::take(&mut self.idrefs);
        let mut unresolved: Vec<(String, ValidatableRc)> = pending
            .into_iter()
            .filter(|(value, _)| !self.ids.contains(value))
            .collect();
        unresolved.sort_by(|a, b| a.0.cmp(&b.0));
        for (value, referer) in unresolved {
            self.report(EventKind::IdNotFound(value), referer.type_name())?;
        }
        Ok(())
    }

    /// Deliver one event through the handler.
    ///
    /// # Errors
    /// [`crate::Error::ValidationAborted`] when the handler rejects the event or
    /// fails; the session then refuses all further operations.
    pub fn report(&mut self, kind: EventKind, source: &str) -> Result<()> {
        self.ensure_active()?;
        let event = ValidationEvent::new(kind, source);
        match self.handler.handle(&event) {
            Ok(true) => {
                self.reported += 1;
                Ok(())
            }
            Ok(false) | Err(_) => {
                self.aborted = true;
                Err(crate::Error::ValidationAborted(event.message))
            }
        }
    }

    /// True once the handler has rejected a report; the session is then unusable.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Number of events the handler has accepted on this pass.
    #[must_use]
    pub fn reported(&self) -> usize {
        self.reported
    }

    /// The namespace bindings of the current traversal position.
    #[must_use]
    pub fn namespaces(&self) -> &NamespaceContext {
        &self.namespaces
    }

    /// Mutable namespace bindings, for scope management during traversal.
    pub fn namespaces_mut(&mut self) -> &mut NamespaceContext {
        &mut self.namespaces
    }

    fn ensure_active(&self) -> Result<()> {
        if self.aborted {
            return Err(crate::Error::ValidationAborted(
                "session already aborted".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::event::CollectingHandler;

    struct Leaf {
        name: &'static str,
    }

    impl Validatable for Leaf {
        fn type_name(&self) -> &str {
            self.name
        }
    }

    struct NoopValidator;

    impl InstanceValidator for NoopValidator {
        fn validate(&self, _object: &ValidatableRc, _session: &mut ValidationSession) -> Result<()> {
            Ok(())
        }
    }

    fn session_with_collector() -> (ValidationSession, Arc<CollectingHandler>) {
        let handler = Arc::new(CollectingHandler::new());
        (
            ValidationSession::new(Arc::new(NoopValidator), handler.clone()),
            handler,
        )
    }

    #[test]
    fn test_revisit_is_a_cycle() {
        let (mut session, handler) = session_with_collector();
        let node: ValidatableRc = Arc::new(Leaf { name: "demo.Node" });
        session.validate(&node).unwrap();
        session.validate(&node).unwrap();
        let events = handler.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::CycleDetected);
    }

    #[test]
    fn test_identity_is_the_reference_not_the_value() {
        let (mut session, handler) = session_with_collector();
        let a: ValidatableRc = Arc::new(Leaf { name: "demo.Node" });
        let b: ValidatableRc = Arc::new(Leaf { name: "demo.Node" });
        session.validate(&a).unwrap();
        session.validate(&b).unwrap();
        assert!(handler.events().is_empty());
    }

    #[test]
    fn test_duplicate_id_reported_once_per_redeclaration() {
        let (mut session, handler) = session_with_collector();
        let owner: ValidatableRc = Arc::new(Leaf { name: "demo.Node" });
        session.on_id(&owner, "n1".to_string()).unwrap();
        session.on_id(&owner, "n1".to_string()).unwrap();
        let events = handler.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::DuplicateId("n1".to_string()));
    }

    #[test]
    fn test_forward_and_backward_references_resolve_silently() {
        let (mut session, handler) = session_with_collector();
        let node: ValidatableRc = Arc::new(Leaf { name: "demo.Node" });
        // forward: reference before declaration
        session.on_idref(&node, "n1".to_string()).unwrap();
        session.on_id(&node, "n1".to_string()).unwrap();
        // backward: declaration before reference
        session.on_id(&node, "n2".to_string()).unwrap();
        session.on_idref(&node, "n2".to_string()).unwrap();
        session.reconcile_ids().unwrap();
        assert!(handler.events().is_empty());
    }

    #[test]
    fn test_unresolved_reference_attributed_to_first_referer() {
        let (mut session, handler) = session_with_collector();
        let first: ValidatableRc = Arc::new(Leaf { name: "demo.First" });
        let second: ValidatableRc = Arc::new(Leaf { name: "demo.Second" });
        session.on_idref(&first, "ghost".to_string()).unwrap();
        session.on_idref(&second, "ghost".to_string()).unwrap();
        session.reconcile_ids().unwrap();
        let events = handler.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::IdNotFound("ghost".to_string()));
        assert_eq!(events[0].source, "demo.First");
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let (mut session, handler) = session_with_collector();
        let node: ValidatableRc = Arc::new(Leaf { name: "demo.Node" });
        session.on_idref(&node, "ghost".to_string()).unwrap();
        session.reconcile_ids().unwrap();
        session.reconcile_ids().unwrap();
        assert_eq!(handler.events().len(), 1);
    }

    struct RejectingHandler;

    impl EventHandler for RejectingHandler {
        fn handle(&self, _event: &ValidationEvent) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_rejection_aborts_the_session() {
        let mut session =
            ValidationSession::new(Arc::new(NoopValidator), Arc::new(RejectingHandler));
        let node: ValidatableRc = Arc::new(Leaf { name: "demo.Node" });
        session.validate(&node).unwrap();
        assert!(matches!(
            session.validate(&node),
            Err(crate::Error::ValidationAborted(_))
        ));
        assert!(session.is_aborted());
        // everything after the abort fails fast
        let fresh: ValidatableRc = Arc::new(Leaf { name: "demo.Other" });
        assert!(session.validate(&fresh).is_err());
        assert!(session.on_id(&fresh, "n1".to_string()).is_err());
        assert!(session.reconcile_ids().is_err());
        assert_eq!(session.reported(), 0);
    }
}
