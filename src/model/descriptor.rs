//! Type descriptors for the binding model.
//!
//! This module defines the immutable, reference-counted description of a type in an
//! introspected universe. A [`TypeDesc`] is a closed sum type with exactly five shapes -
//! plain class, parameterized type, array, type variable, and wildcard - so that every
//! traversal algorithm (base-class resolution, substitution, erasure) is an exhaustive
//! `match` checked by the compiler.
//!
//! # Key Components
//!
//! - [`ClassId`]: Opaque identity of a class declaration within one navigator's universe
//! - [`TypeDesc`]: The five-variant descriptor, handled as [`TypeDescRc`]
//! - [`TypeVarDecl`]: A named type variable with single-assignment bounds
//! - [`Builtin`]: Well-known classes present in every universe at fixed identities
//!
//! # Structural Sharing
//!
//! Descriptors are immutable once constructed. Substitution and erasure return the
//! *original* `Arc` whenever no nested type changed, so "nothing was rebuilt" is
//! observable through [`std::sync::Arc::ptr_eq`].

use std::fmt;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, OnceLock,
};

use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::Result;

/// Reference to a [`TypeDesc`].
pub type TypeDescRc = Arc<TypeDesc>;
/// Reference to a [`TypeVarDecl`].
pub type TypeVarRc = Arc<TypeVarDecl>;

/// Identity of a class declaration within one navigator's universe.
///
/// A `ClassId` is only meaningful to the navigator that issued it; identities from
/// different universes must never be mixed. The well-known [`Builtin`] classes occupy
/// the same fixed low identities in every universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    /// Create a new class identity from its raw index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        ClassId(value)
    }

    /// The raw index of this identity.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// Well-known classes that every type universe provides at fixed identities.
///
/// These play the role the runtime's built-in types play in the original setting:
/// `Object` is the unconstrained default, `Collection` is the sequence capability that
/// collection detection resolves against, and `Byte` marks the component type of the
/// binary-blob array that is deliberately *not* treated as a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter)]
#[repr(u32)]
pub enum Builtin {
    /// The unconstrained root type.
    Object = 0,
    /// Character string scalar.
    String = 1,
    /// Boolean scalar.
    Boolean = 2,
    /// 32-bit integer scalar.
    Int32 = 3,
    /// 64-bit integer scalar.
    Int64 = 4,
    /// 64-bit float scalar.
    Float64 = 5,
    /// Single byte; `Array(Byte)` is a binary blob, not a sequence.
    Byte = 6,
    /// The generic sequence capability `Collection<E>`.
    Collection = 7,
}

impl Builtin {
    /// The fixed class identity of this builtin in every universe.
    #[must_use]
    pub const fn class_id(self) -> ClassId {
        ClassId(self as u32)
    }

    /// The universe-wide name of this builtin.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Object => "core.Object",
            Builtin::String => "core.String",
            Builtin::Boolean => "core.Boolean",
            Builtin::Int32 => "core.Int32",
            Builtin::Int64 => "core.Int64",
            Builtin::Float64 => "core.Float64",
            Builtin::Byte => "core.Byte",
            Builtin::Collection => "core.Collection",
        }
    }

    /// Reverse lookup from a class identity.
    #[must_use]
    pub fn from_class(class: ClassId) -> Option<Builtin> {
        Builtin::iter().find(|b| b.class_id() == class)
    }

    /// True for the scalar builtins (everything except `Object` and `Collection`).
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(self, Builtin::Object | Builtin::Collection)
    }
}

/// Process-unique identities for type variables, used for free-variable matching and
/// registry keys.
static VAR_IDS: AtomicU32 = AtomicU32::new(0);

/// A declared type variable.
///
/// Bounds are single-assignment so that F-bounded declarations (a variable whose bound
/// mentions the variable itself) can be constructed in two steps. An unset or empty
/// bound list means the variable is bounded by `Object`.
pub struct TypeVarDecl {
    id: u32,
    name: String,
    bounds: OnceLock<Vec<TypeDescRc>>,
}

impl TypeVarDecl {
    /// Create a new variable with no bounds yet.
    #[must_use]
    pub fn new(name: &str) -> TypeVarRc {
        Arc::new(TypeVarDecl {
            id: VAR_IDS.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            bounds: OnceLock::new(),
        })
    }

    /// Create a new variable with its bounds known up front.
    #[must_use]
    pub fn with_bounds(name: &str, bounds: Vec<TypeDescRc>) -> TypeVarRc {
        let var = TypeVarDecl::new(name);
        var.bounds.set(bounds).ok();
        var
    }

    /// Assign the bounds of a two-step declaration.
    ///
    /// # Errors
    /// Returns [`crate::Error::ModelUsage`] if the bounds were already assigned.
    pub fn set_bounds(&self, bounds: Vec<TypeDescRc>) -> Result<()> {
        self.bounds.set(bounds).map_err(|_| {
            crate::Error::ModelUsage(format!("bounds of type variable `{}` assigned twice", self.name))
        })
    }

    /// The process-unique identity of this variable.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The declared name of this variable.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared bounds; empty when the variable is only bounded by `Object`.
    #[must_use]
    pub fn bounds(&self) -> &[TypeDescRc] {
        self.bounds.get().map_or(&[], Vec::as_slice)
    }

    /// The first declared bound, if any.
    #[must_use]
    pub fn first_bound(&self) -> Option<TypeDescRc> {
        self.bounds().first().cloned()
    }
}

impl fmt::Debug for TypeVarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeVarDecl({}#{})", self.name, self.id)
    }
}

/// Description of a type in an introspected universe.
///
/// Exactly five shapes exist; every traversal algorithm over descriptors is an
/// exhaustive `match`, so adding a shape is a compile-checked exercise.
#[derive(Debug)]
pub enum TypeDesc {
    /// A plain (possibly raw-generic) class.
    Class(ClassId),
    /// An instantiation of a generic class.
    Parameterized {
        /// The generic class being instantiated.
        raw: ClassId,
        /// Actual type arguments, one per declared parameter of `raw`.
        args: Vec<TypeDescRc>,
        /// Enclosing instantiation for nested generic classes, if any.
        owner: Option<TypeDescRc>,
    },
    /// An array of a component type.
    Array(TypeDescRc),
    /// A reference to a declared type variable.
    Variable(TypeVarRc),
    /// A bounded wildcard.
    Wildcard {
        /// Lower ("super") bounds.
        lower: Vec<TypeDescRc>,
        /// Upper ("extends") bounds.
        upper: Vec<TypeDescRc>,
    },
}

impl TypeDesc {
    /// Descriptor for a plain class.
    #[must_use]
    pub fn class(class: ClassId) -> TypeDescRc {
        Arc::new(TypeDesc::Class(class))
    }

    /// Descriptor for the unconstrained `Object` builtin.
    #[must_use]
    pub fn object() -> TypeDescRc {
        TypeDesc::class(Builtin::Object.class_id())
    }

    /// Descriptor for an instantiation of `raw` with the given arguments.
    #[must_use]
    pub fn parameterized(raw: ClassId, args: Vec<TypeDescRc>) -> TypeDescRc {
        Arc::new(TypeDesc::Parameterized {
            raw,
            args,
            owner: None,
        })
    }

    /// Descriptor for a nested instantiation with an enclosing owner type.
    #[must_use]
    pub fn parameterized_with_owner(
        raw: ClassId,
        args: Vec<TypeDescRc>,
        owner: TypeDescRc,
    ) -> TypeDescRc {
        Arc::new(TypeDesc::Parameterized {
            raw,
            args,
            owner: Some(owner),
        })
    }

    /// Descriptor for an array of `component`.
    #[must_use]
    pub fn array(component: TypeDescRc) -> TypeDescRc {
        Arc::new(TypeDesc::Array(component))
    }

    /// Descriptor referencing a declared type variable.
    #[must_use]
    pub fn variable(var: TypeVarRc) -> TypeDescRc {
        Arc::new(TypeDesc::Variable(var))
    }

    /// Descriptor for an upper-bounded wildcard (`? extends ...`).
    #[must_use]
    pub fn wildcard_extends(upper: Vec<TypeDescRc>) -> TypeDescRc {
        Arc::new(TypeDesc::Wildcard {
            lower: Vec::new(),
            upper,
        })
    }

    /// Descriptor for a lower-bounded wildcard (`? super ...`).
    #[must_use]
    pub fn wildcard_super(lower: Vec<TypeDescRc>) -> TypeDescRc {
        Arc::new(TypeDesc::Wildcard {
            lower,
            upper: Vec::new(),
        })
    }

    /// True if this descriptor is an array of any component.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, TypeDesc::Array(_))
    }

    /// True if this descriptor is a generic instantiation.
    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        matches!(self, TypeDesc::Parameterized { .. })
    }

    /// The plain class identity of this descriptor, if it is a plain class.
    #[must_use]
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            TypeDesc::Class(c) => Some(*c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_identities_are_fixed() {
        assert_eq!(Builtin::Object.class_id(), ClassId::new(0));
        assert_eq!(Builtin::Collection.class_id(), ClassId::new(7));
        assert_eq!(Builtin::from_class(ClassId::new(6)), Some(Builtin::Byte));
        assert_eq!(Builtin::from_class(ClassId::new(99)), None);
    }

    #[test]
    fn test_builtin_scalars() {
        assert!(Builtin::String.is_scalar());
        assert!(Builtin::Byte.is_scalar());
        assert!(!Builtin::Object.is_scalar());
        assert!(!Builtin::Collection.is_scalar());
    }

    #[test]
    fn test_type_var_identity_is_unique() {
        let a = TypeVarDecl::new("T");
        let b = TypeVarDecl::new("T");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_type_var_bounds_single_assignment() {
        let v = TypeVarDecl::new("T");
        assert!(v.first_bound().is_none());
        v.set_bounds(vec![TypeDesc::object()]).unwrap();
        assert!(v.first_bound().is_some());
        assert!(v.set_bounds(vec![TypeDesc::object()]).is_err());
    }

    #[test]
    fn test_descriptor_shapes() {
        let list = ClassId::new(42);
        let t = TypeDesc::parameterized(list, vec![TypeDesc::object()]);
        assert!(t.is_parameterized());
        assert!(!t.is_array());
        assert_eq!(t.as_class(), None);

        let a = TypeDesc::array(TypeDesc::class(Builtin::String.class_id()));
        assert!(a.is_array());

        let c = TypeDesc::class(list);
        assert_eq!(c.as_class(), Some(list));
    }
}
