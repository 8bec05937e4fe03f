//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use bindscope::prelude::*;
//! ```

// Error handling
pub use crate::{Error, Result};

// Type descriptors
pub use crate::model::descriptor::{
    Builtin, ClassId, TypeDesc, TypeDescRc, TypeVarDecl, TypeVarRc,
};

// Declarations and navigation
pub use crate::model::nav::{
    ClassDecl, ClassModifiers, ClassSource, DeclNavigator, DeclUniverse, FieldDecl, MethodDecl,
    Navigator, PropertyMarkers, ReflectNavigator,
};

// Binding model
pub use crate::model::{
    builder::{ModelBuilder, TypeModel},
    class::{ClassModel, ClassModelRef},
    property::{AccessorSeed, FieldSeed, IdentityRole, PropertyDescriptor, PropertySeed},
    registry::{TypeEntry, TypeRegistry},
};

// Validation
pub use crate::validation::{
    CollectingHandler, EventHandler, EventKind, InstanceValidator, NamespaceContext, Severity,
    Validatable, ValidatableRc, ValidationEvent, ValidationSession,
};
