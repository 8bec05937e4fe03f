//! Instance-graph validation.
//!
//! Validates object graphs against a built binding model: a
//! [`ValidationSession`] drives one depth-first pass with reference-identity cycle
//! detection and ID/IDREF reconciliation, delivering every reportable condition
//! through a pluggable [`EventHandler`] with abort semantics.

mod event;
mod namespace;
mod session;

pub use event::{CollectingHandler, EventHandler, EventKind, Severity, ValidationEvent};
pub use namespace::NamespaceContext;
pub use session::{InstanceValidator, Validatable, ValidatableRc, ValidationSession};
