//! Property descriptors and the seeds they are derived from.
//!
//! A [`PropertySeed`] is the builder's uniform view of "something that becomes a
//! property" - a declared field, or a paired getter/setter. From a seed the builder
//! derives a [`PropertyDescriptor`]: the identity role is computed eagerly at
//! construction, while the collection flag and the element type are derived lazily,
//! memoized, and routed through the owning model's type registry so that repeated
//! queries hand back pointer-identical descriptors.

use std::sync::{Arc, OnceLock};

use crate::{
    model::{
        builder::ModelContext,
        descriptor::TypeDescRc,
        nav::{FieldDecl, PropertyMarkers},
    },
    Result,
};

/// The identity role a property plays in ID/IDREF reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRole {
    /// The property carries no identity semantics.
    None,
    /// The property declares a unique identifier value.
    Id,
    /// The property references an identifier declared elsewhere.
    IdRef,
}

impl IdentityRole {
    /// Derive the role from declaration markers. A member carrying both markers is
    /// treated as an ID declaration.
    #[must_use]
    pub fn from_markers(markers: PropertyMarkers) -> IdentityRole {
        if markers.contains(PropertyMarkers::ID) {
            IdentityRole::Id
        } else if markers.contains(PropertyMarkers::IDREF) {
            IdentityRole::IdRef
        } else {
            IdentityRole::None
        }
    }
}

/// Uniform view of a declaration that becomes a property.
pub trait PropertySeed {
    /// The property name.
    fn name(&self) -> &str;
    /// The declared (possibly generic) type of the property.
    fn raw_type(&self) -> &TypeDescRc;
    /// The declaration markers driving identity and exclusion.
    fn markers(&self) -> PropertyMarkers;
}

/// Seed backed by a declared field.
pub struct FieldSeed {
    decl: FieldDecl,
}

impl FieldSeed {
    /// Wrap a field declaration.
    #[must_use]
    pub fn new(decl: FieldDecl) -> Self {
        FieldSeed { decl }
    }
}

impl PropertySeed for FieldSeed {
    fn name(&self) -> &str {
        &self.decl.name
    }

    fn raw_type(&self) -> &TypeDescRc {
        &self.decl.ty
    }

    fn markers(&self) -> PropertyMarkers {
        self.decl.markers
    }
}

/// Seed backed by a getter/setter accessor pair.
///
/// The property name is the accessor name with its `get_`/`set_` prefix stripped; the
/// property type is the getter's return type; the markers are the union of both
/// accessors' markers.
pub struct AccessorSeed {
    name: String,
    ty: TypeDescRc,
    markers: PropertyMarkers,
}

impl AccessorSeed {
    /// Create an accessor-pair seed.
    #[must_use]
    pub fn new(name: &str, ty: TypeDescRc, markers: PropertyMarkers) -> Self {
        AccessorSeed {
            name: name.to_string(),
            ty,
            markers,
        }
    }
}

impl PropertySeed for AccessorSeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn raw_type(&self) -> &TypeDescRc {
        &self.ty
    }

    fn markers(&self) -> PropertyMarkers {
        self.markers
    }
}

/// One property of a class model.
///
/// The collection flag and the element type are derived on first query and memoized.
/// Element-type derivation additionally requires the owning model to be linked, since
/// it interns the result into the shared type registry; querying it earlier is a
/// lifecycle violation reported as [`crate::Error::ModelUsage`].
pub struct PropertyDescriptor {
    name: String,
    raw: TypeDescRc,
    identity: IdentityRole,
    ctx: Arc<ModelContext>,
    is_collection: OnceLock<bool>,
    element: OnceLock<TypeDescRc>,
}

impl PropertyDescriptor {
    pub(crate) fn from_seed<S: PropertySeed>(seed: &S, ctx: Arc<ModelContext>) -> Self {
        PropertyDescriptor {
            name: seed.name().to_string(),
            raw: seed.raw_type().clone(),
            identity: IdentityRole::from_markers(seed.markers()),
            ctx,
            is_collection: OnceLock::new(),
            element: OnceLock::new(),
        }
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type of the property, before any collection unwrapping.
    #[must_use]
    pub fn raw_type(&self) -> &TypeDescRc {
        &self.raw
    }

    /// The identity role, derived eagerly at construction.
    #[must_use]
    pub fn identity(&self) -> IdentityRole {
        self.identity
    }

    /// True if the declared type binds as a sequence. Derived on first query,
    /// memoized for the life of the descriptor.
    pub fn is_collection(&self) -> Result<bool> {
        if let Some(cached) = self.is_collection.get() {
            return Ok(*cached);
        }
        let computed = self.ctx.navigator().is_collection_like(&self.raw)?;
        Ok(*self.is_collection.get_or_init(|| computed))
    }

    /// The bindable element type: the declared type itself for single-value
    /// properties, the unwrapped element type for collections. The result is interned
    /// into the owning model's registry, so structurally equal derivations across
    /// properties share one canonical descriptor.
    ///
    /// # Errors
    /// [`crate::Error::ModelUsage`] when queried before the owning model was linked.
    pub fn element_type(&self) -> Result<TypeDescRc> {
        if let Some(cached) = self.element.get() {
            return Ok(cached.clone());
        }
        // checked before the cache is touched, so an early call cannot poison it
        if !self.ctx.is_linked() {
            return Err(crate::Error::ModelUsage(format!(
                "element type of `{}` queried before the model was linked",
                self.name
            )));
        }
        let computed = if self.is_collection()? {
            self.ctx.navigator().element_of(&self.raw)?
        } else {
            self.raw.clone()
        };
        let canonical = self.ctx.registry().intern(&computed).desc().clone();
        Ok(self.element.get_or_init(|| canonical).clone())
    }
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("raw", &self.raw)
            .field("identity", &self.identity)
            .finish()
    }
}
