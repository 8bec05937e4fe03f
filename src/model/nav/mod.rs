//! Navigation over introspected type universes.
//!
//! A [`Navigator`] answers structural queries - superclass, generic interfaces, type
//! parameters, field and method enumeration, erasure, base-class resolution with
//! type-argument substitution, array and collection detection - independent of how the
//! underlying universe is introspected. Two implementations exist behind the one
//! contract:
//!
//! - [`DeclNavigator`]: eager, built from explicit declaration tables
//! - [`ReflectNavigator`]: lazy, backed by a [`ClassSource`] provider with an
//!   instance-owned memoization cache
//!
//! The traversal algorithms themselves (base-class finder, substitution binder, eraser)
//! live in [`visitor`] as exhaustive matches over the five descriptor shapes and are
//! surfaced here as provided trait methods, so both backends share one set of semantics.
//!
//! # Failure Semantics
//!
//! Navigator operations never fail for structurally valid but semantically unusual
//! input - a raw use of a generic class is answered, not rejected. Only genuinely
//! malformed shapes (component type of a non-array, argument of a non-parameterized
//! type, arity mismatches) produce [`crate::Error::UnsupportedShape`].

mod decl;
mod reflect;
pub(crate) mod visitor;

pub use decl::{DeclNavigator, DeclUniverse};
pub use reflect::{ClassSource, ReflectNavigator};

use std::sync::Arc;

use bitflags::bitflags;

use crate::{
    model::descriptor::{Builtin, ClassId, TypeDesc, TypeDescRc, TypeVarDecl, TypeVarRc},
    Result,
};

bitflags! {
    /// Modifiers of a class declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClassModifiers: u32 {
        /// The class cannot be instantiated directly.
        const ABSTRACT = 0x0001;
        /// The declaration is an interface.
        const INTERFACE = 0x0002;
        /// The declaration is an enumeration.
        const ENUM = 0x0004;
        /// The class exposes a zero-argument constructor.
        const HAS_DEFAULT_CTOR = 0x0008;
    }
}

bitflags! {
    /// Markers attached to field and method declarations.
    ///
    /// `ID` and `IDREF` drive the identity role of derived properties; `STATIC` and
    /// `TRANSIENT` members are skipped during model building.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropertyMarkers: u32 {
        /// The member declares a unique identifier value.
        const ID = 0x0001;
        /// The member references an identifier declared elsewhere.
        const IDREF = 0x0002;
        /// The member belongs to the class, not to instances.
        const STATIC = 0x0004;
        /// The member is excluded from the binding model.
        const TRANSIENT = 0x0008;
    }
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Declared field name.
    pub name: String,
    /// Declared (possibly generic) field type.
    pub ty: TypeDescRc,
    /// Declaration markers.
    pub markers: PropertyMarkers,
}

impl FieldDecl {
    /// Create a field declaration.
    #[must_use]
    pub fn new(name: &str, ty: TypeDescRc, markers: PropertyMarkers) -> Self {
        FieldDecl {
            name: name.to_string(),
            ty,
            markers,
        }
    }
}

/// A declared method.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Declared method name.
    pub name: String,
    /// Declared (possibly generic) return type.
    pub return_ty: TypeDescRc,
    /// Declared parameter types, in order.
    pub params: Vec<TypeDescRc>,
    /// Declaration markers.
    pub markers: PropertyMarkers,
}

impl MethodDecl {
    /// Create a parameterless method declaration.
    #[must_use]
    pub fn new(name: &str, return_ty: TypeDescRc) -> Self {
        MethodDecl {
            name: name.to_string(),
            return_ty,
            params: Vec::new(),
            markers: PropertyMarkers::empty(),
        }
    }

    /// Append a parameter type.
    #[must_use]
    pub fn with_param(mut self, ty: TypeDescRc) -> Self {
        self.params.push(ty);
        self
    }

    /// Replace the declaration markers.
    #[must_use]
    pub fn with_markers(mut self, markers: PropertyMarkers) -> Self {
        self.markers = markers;
        self
    }
}

/// A class declaration: the unit both navigator backends produce.
///
/// `superclass` and `interfaces` are *generic* ancestor descriptors - they may
/// reference the declaring class's own type parameters, which base-class resolution
/// substitutes when walking an instantiation. A `superclass` of `None` means the class
/// extends only `Object`.
#[derive(Debug)]
pub struct ClassDecl {
    /// Fully qualified class name, unique within the universe.
    pub name: String,
    /// Class modifiers.
    pub modifiers: ClassModifiers,
    /// Declared type parameters, in order.
    pub type_params: Vec<TypeVarRc>,
    /// Generic superclass, if any besides `Object`.
    pub superclass: Option<TypeDescRc>,
    /// Generic interfaces, in declaration order.
    pub interfaces: Vec<TypeDescRc>,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldDecl>,
    /// Declared methods, in declaration order.
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    /// Create an empty class declaration.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ClassDecl {
            name: name.to_string(),
            modifiers: ClassModifiers::empty(),
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Replace the class modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: ClassModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Append a declared type parameter.
    #[must_use]
    pub fn with_type_param(mut self, var: TypeVarRc) -> Self {
        self.type_params.push(var);
        self
    }

    /// Set the generic superclass.
    #[must_use]
    pub fn with_superclass(mut self, superclass: TypeDescRc) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Append a generic interface.
    #[must_use]
    pub fn with_interface(mut self, interface: TypeDescRc) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Append a declared field.
    #[must_use]
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a declared method.
    #[must_use]
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

/// Declarations for the [`Builtin`] classes, seeded into every universe.
pub(crate) fn builtin_decls() -> Vec<ClassDecl> {
    use strum::IntoEnumIterator;

    Builtin::iter()
        .map(|b| match b {
            Builtin::Object => ClassDecl::new(b.name()),
            Builtin::Collection => ClassDecl::new(b.name())
                .with_modifiers(ClassModifiers::INTERFACE)
                .with_type_param(TypeVarDecl::new("E")),
            _ => ClassDecl::new(b.name()).with_superclass(TypeDesc::object()),
        })
        .collect()
}

/// Capability-set contract over an arbitrary type universe.
///
/// Implementations supply identity management (`lookup`) and declaration retrieval
/// (`decl_of`); everything else - erasure, base-class resolution, substitution, array
/// and collection handling - is provided in terms of those and shared by all backends.
pub trait Navigator: Send + Sync {
    /// Short name of the backing universe, used in diagnostics.
    fn universe_name(&self) -> &str;

    /// Resolve a class name to its identity in this universe.
    fn lookup(&self, name: &str) -> Option<ClassId>;

    /// Retrieve the declaration behind a class identity.
    ///
    /// # Errors
    /// [`crate::Error::UnknownClass`] if the identity was never issued by this
    /// navigator; [`crate::Error::ClassNotFound`] if the backing source has no
    /// declaration for it.
    fn decl_of(&self, class: ClassId) -> Result<Arc<ClassDecl>>;

    /// The fully qualified name of a class.
    fn class_name(&self, class: ClassId) -> Result<String> {
        Ok(self.decl_of(class)?.name.clone())
    }

    /// The generic superclass of a class, `None` when it extends only `Object`.
    fn superclass(&self, class: ClassId) -> Result<Option<TypeDescRc>> {
        Ok(self.decl_of(class)?.superclass.clone())
    }

    /// The generic interfaces of a class, in declaration order.
    fn interfaces(&self, class: ClassId) -> Result<Vec<TypeDescRc>> {
        Ok(self.decl_of(class)?.interfaces.clone())
    }

    /// The declared type parameters of a class, in order.
    fn type_parameters(&self, class: ClassId) -> Result<Vec<TypeVarRc>> {
        Ok(self.decl_of(class)?.type_params.clone())
    }

    /// The declared fields of a class, in declaration order.
    fn fields(&self, class: ClassId) -> Result<Vec<FieldDecl>> {
        Ok(self.decl_of(class)?.fields.clone())
    }

    /// The declared methods of a class, in declaration order.
    fn methods(&self, class: ClassId) -> Result<Vec<MethodDecl>> {
        Ok(self.decl_of(class)?.methods.clone())
    }

    /// True if the class is declared abstract.
    fn is_abstract(&self, class: ClassId) -> Result<bool> {
        Ok(self.decl_of(class)?.modifiers.contains(ClassModifiers::ABSTRACT))
    }

    /// True if the declaration is an interface.
    fn is_interface(&self, class: ClassId) -> Result<bool> {
        Ok(self.decl_of(class)?.modifiers.contains(ClassModifiers::INTERFACE))
    }

    /// True if the declaration is an enumeration.
    fn is_enum(&self, class: ClassId) -> Result<bool> {
        Ok(self.decl_of(class)?.modifiers.contains(ClassModifiers::ENUM))
    }

    /// True if the class exposes a zero-argument constructor.
    fn has_default_constructor(&self, class: ClassId) -> Result<bool> {
        Ok(self
            .decl_of(class)?
            .modifiers
            .contains(ClassModifiers::HAS_DEFAULT_CTOR))
    }

    /// Find the instantiation of `target` in the ancestry of `t`, with all type
    /// arguments substituted according to `t`'s own binding.
    ///
    /// Walks the superclass chain first, then interfaces, depth-first. Returns
    /// `Ok(None)` when no ancestor matches - callers treat that as "default to the
    /// unconstrained object type", never as an error.
    fn base_class(&self, t: &TypeDescRc, target: ClassId) -> Result<Option<TypeDescRc>> {
        visitor::find_base(self, t, target, 0)
    }

    /// Replace every type variable of `params` occurring in `t` by the corresponding
    /// entry of `args`. Free variables pass through unchanged; when nothing changes
    /// the original descriptor is returned (structural sharing).
    fn bind(&self, t: &TypeDescRc, params: &[TypeVarRc], args: &[TypeDescRc]) -> Result<TypeDescRc> {
        visitor::bind(t, params, args)
    }

    /// Strip all generic information down to the nearest concrete raw type.
    fn erasure(&self, t: &TypeDescRc) -> Result<TypeDescRc> {
        visitor::erase(t, 0)
    }

    /// The erased class identity of `t`, or `None` when the erasure is an array.
    fn erasure_class(&self, t: &TypeDescRc) -> Result<Option<ClassId>> {
        Ok(self.erasure(t)?.as_class())
    }

    /// True if `t` is an array of any component.
    fn is_array(&self, t: &TypeDescRc) -> bool {
        t.is_array()
    }

    /// True if `t` is an array other than the byte array, which is treated as a
    /// scalar binary blob rather than a sequence.
    fn is_array_but_not_byte_array(&self, t: &TypeDescRc) -> bool {
        match &**t {
            TypeDesc::Array(component) => {
                component.as_class() != Some(Builtin::Byte.class_id())
            }
            _ => false,
        }
    }

    /// The component type of an array.
    ///
    /// # Errors
    /// [`crate::Error::UnsupportedShape`] if `t` is not an array.
    fn component_type(&self, t: &TypeDescRc) -> Result<TypeDescRc> {
        match &**t {
            TypeDesc::Array(component) => Ok(component.clone()),
            other => Err(shape_error!("component type requested of non-array {:?}", other)),
        }
    }

    /// The `i`-th actual type argument of a parameterized type.
    ///
    /// # Errors
    /// [`crate::Error::UnsupportedShape`] if `t` is not parameterized or has no
    /// `i`-th argument.
    fn type_argument(&self, t: &TypeDescRc, i: usize) -> Result<TypeDescRc> {
        match &**t {
            TypeDesc::Parameterized { args, .. } => args.get(i).cloned().ok_or_else(|| {
                shape_error!("parameterized type has no argument at index {}", i)
            }),
            other => Err(shape_error!("type argument requested of non-parameterized {:?}", other)),
        }
    }

    /// True if `t` is a generic instantiation.
    fn is_parameterized(&self, t: &TypeDescRc) -> bool {
        t.is_parameterized()
    }

    /// Construct the instantiation of `raw` with the given arguments.
    ///
    /// # Errors
    /// [`crate::Error::UnsupportedShape`] if the argument count does not match the
    /// declared parameter count of `raw`.
    fn parameterized(&self, raw: ClassId, args: Vec<TypeDescRc>) -> Result<TypeDescRc> {
        let params = self.type_parameters(raw)?;
        if params.len() != args.len() {
            return Err(shape_error!(
                "{} declares {} type parameter(s) but {} argument(s) were supplied",
                self.class_name(raw)?,
                params.len(),
                args.len()
            ));
        }
        Ok(TypeDesc::parameterized(raw, args))
    }

    /// True if the erasure of `sub` is a subtype of the erasure of `sup`.
    ///
    /// Arrays are covariant in their component; everything is a subtype of `Object`.
    fn is_subclass_of(&self, sub: &TypeDescRc, sup: &TypeDescRc) -> Result<bool> {
        let sub_e = self.erasure(sub)?;
        let sup_e = self.erasure(sup)?;
        if sup_e.as_class() == Some(Builtin::Object.class_id()) {
            return Ok(true);
        }
        match (&*sub_e, &*sup_e) {
            (TypeDesc::Class(a), TypeDesc::Class(b)) => visitor::is_ancestor(self, *a, *b, 0),
            (TypeDesc::Array(a), TypeDesc::Array(b)) => self.is_subclass_of(a, b),
            _ => Ok(false),
        }
    }

    /// True if `t` binds as a sequence: an array (byte arrays excluded) or a subtype
    /// of the `Collection` capability.
    fn is_collection_like(&self, t: &TypeDescRc) -> Result<bool> {
        if self.is_array_but_not_byte_array(t) {
            return Ok(true);
        }
        let collection = TypeDesc::class(Builtin::Collection.class_id());
        self.is_subclass_of(t, &collection)
    }

    /// The element type of a collection-like `t`: the array component if `t` is an
    /// array, else the first type argument of the resolved `Collection` instantiation,
    /// else the unconstrained object type for raw uses.
    fn element_of(&self, t: &TypeDescRc) -> Result<TypeDescRc> {
        if self.is_array_but_not_byte_array(t) {
            return self.component_type(t);
        }
        match self.base_class(t, Builtin::Collection.class_id())? {
            Some(ref base) if base.is_parameterized() => self.type_argument(base, 0),
            _ => Ok(TypeDesc::object()),
        }
    }

    /// Render a descriptor for diagnostics, e.g. `core.Collection<demo.Address>` or
    /// `core.String[]`.
    fn type_name(&self, t: &TypeDescRc) -> Result<String> {
        match &**t {
            TypeDesc::Class(c) => self.class_name(*c),
            TypeDesc::Parameterized { raw, args, .. } => {
                let rendered: Result<Vec<String>> =
                    args.iter().map(|a| self.type_name(a)).collect();
                Ok(format!("{}<{}>", self.class_name(*raw)?, rendered?.join(", ")))
            }
            TypeDesc::Array(component) => Ok(format!("{}[]", self.type_name(component)?)),
            TypeDesc::Variable(var) => Ok(var.name().to_string()),
            TypeDesc::Wildcard { lower, upper } => {
                if let Some(lb) = lower.first() {
                    Ok(format!("? super {}", self.type_name(lb)?))
                } else if let Some(ub) = upper.first() {
                    Ok(format!("? extends {}", self.type_name(ub)?))
                } else {
                    Ok("?".to_string())
                }
            }
        }
    }
}
