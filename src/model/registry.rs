//! Interning registry of resolved type descriptors.
//!
//! Every type the model builder or a property derivation resolves is interned here
//! exactly once: structurally equal descriptors map to one [`TypeEntry`] carrying the
//! canonical [`TypeDescRc`], so repeated derivations hand back pointer-identical
//! descriptors. Entries for class-shaped types additionally carry a weak link to the
//! [`crate::model::class::ClassModel`] that represents them.
//!
//! The registry is append-only and lock-free on the read path: a skip list keyed by
//! entry identity holds the entries themselves, with hash indices for structural
//! lookup and per-class grouping.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, OnceLock,
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    model::{
        class::{ClassModel, ClassModelRef},
        descriptor::{ClassId, TypeDesc, TypeDescRc},
    },
    Result,
};

/// Structural identity of a descriptor, used as the interning key.
///
/// Two descriptors get the same key exactly when they are structurally equal; type
/// variables compare by their process-unique identity, never by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum TypeKey {
    Class(ClassId),
    Parameterized {
        raw: ClassId,
        args: Vec<TypeKey>,
        owner: Option<Box<TypeKey>>,
    },
    Array(Box<TypeKey>),
    Variable(u32),
    Wildcard {
        lower: Vec<TypeKey>,
        upper: Vec<TypeKey>,
    },
}

impl TypeKey {
    pub(crate) fn of(desc: &TypeDesc) -> TypeKey {
        match desc {
            TypeDesc::Class(c) => TypeKey::Class(*c),
            TypeDesc::Parameterized { raw, args, owner } => TypeKey::Parameterized {
                raw: *raw,
                args: args.iter().map(|a| TypeKey::of(a)).collect(),
                owner: owner.as_ref().map(|o| Box::new(TypeKey::of(o))),
            },
            TypeDesc::Array(component) => TypeKey::Array(Box::new(TypeKey::of(component))),
            TypeDesc::Variable(var) => TypeKey::Variable(var.id()),
            TypeDesc::Wildcard { lower, upper } => TypeKey::Wildcard {
                lower: lower.iter().map(|b| TypeKey::of(b)).collect(),
                upper: upper.iter().map(|b| TypeKey::of(b)).collect(),
            },
        }
    }

    /// The class identity this key groups under, if any.
    fn group_class(&self) -> Option<ClassId> {
        match self {
            TypeKey::Class(c) => Some(*c),
            TypeKey::Parameterized { raw, .. } => Some(*raw),
            _ => None,
        }
    }
}

/// One interned type: the canonical descriptor plus an optional weak link to the class
/// model representing it.
pub struct TypeEntry {
    id: u32,
    desc: TypeDescRc,
    model: OnceLock<ClassModelRef>,
}

impl TypeEntry {
    /// Registry-local identity of this entry.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The canonical descriptor every structurally equal resolution shares.
    #[must_use]
    pub fn desc(&self) -> &TypeDescRc {
        &self.desc
    }

    /// The class model representing this type, if linked and still alive.
    #[must_use]
    pub fn model(&self) -> Option<Arc<ClassModel>> {
        self.model.get().and_then(ClassModelRef::upgrade)
    }

    /// Link the class model representing this type. Relinking the same model is a
    /// no-op; linking a different one is a usage error.
    pub(crate) fn link_model(&self, model: &Arc<ClassModel>) -> Result<()> {
        if self.model.set(ClassModelRef::new(model)).is_err() {
            let same = self
                .model
                .get()
                .and_then(ClassModelRef::upgrade)
                .is_some_and(|existing| Arc::ptr_eq(&existing, model));
            if !same {
                return Err(crate::Error::ModelUsage(format!(
                    "conflicting class model linked to type entry #{}",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeEntry")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .finish()
    }
}

/// Append-only interning registry of resolved types.
pub struct TypeRegistry {
    entries: SkipMap<u32, Arc<TypeEntry>>,
    index: DashMap<TypeKey, u32>,
    by_class: DashMap<ClassId, Vec<u32>>,
    next: AtomicU32,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        TypeRegistry {
            entries: SkipMap::new(),
            index: DashMap::new(),
            by_class: DashMap::new(),
            next: AtomicU32::new(0),
        }
    }

    /// Intern `desc`, returning the entry holding its canonical descriptor.
    ///
    /// The first interning of a structure makes `desc` canonical; later internings of
    /// structurally equal descriptors return the same entry, pointer-identical
    /// canonical descriptor included.
    pub fn intern(&self, desc: &TypeDescRc) -> Arc<TypeEntry> {
        let key = TypeKey::of(desc);
        let id = *self.index.entry(key.clone()).or_insert_with(|| {
            let id = self.next.fetch_add(1, Ordering::SeqCst);
            let entry = Arc::new(TypeEntry {
                id,
                desc: desc.clone(),
                model: OnceLock::new(),
            });
            self.entries.insert(id, entry);
            if let Some(class) = key.group_class() {
                self.by_class.entry(class).or_default().push(id);
            }
            id
        });
        // the index entry is only published after the skip-list insert
        self.entries
            .get(&id)
            .map(|e| e.value().clone())
            .unwrap_or_else(|| unreachable!("interned entry #{id} missing from registry"))
    }

    /// Look up an already interned structure without interning it.
    #[must_use]
    pub fn get(&self, desc: &TypeDescRc) -> Option<Arc<TypeEntry>> {
        let id = *self.index.get(&TypeKey::of(desc))?;
        self.entries.get(&id).map(|e| e.value().clone())
    }

    /// Look up an entry by its registry-local identity.
    #[must_use]
    pub fn by_id(&self, id: u32) -> Option<Arc<TypeEntry>> {
        self.entries.get(&id).map(|e| e.value().clone())
    }

    /// All entries whose type is `class` or an instantiation of it.
    #[must_use]
    pub fn by_class(&self, class: ClassId) -> Vec<Arc<TypeEntry>> {
        self.by_class
            .get(&class)
            .map(|ids| ids.iter().filter_map(|id| self.by_id(*id)).collect())
            .unwrap_or_default()
    }

    /// Number of interned types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all entries in interning order.
    #[must_use]
    pub fn entries(&self) -> Vec<Arc<TypeEntry>> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::{Builtin, TypeVarDecl};

    #[test]
    fn test_intern_returns_canonical_descriptor() {
        let registry = TypeRegistry::new();
        let list = ClassId::new(40);
        let a = TypeDesc::parameterized(list, vec![TypeDesc::object()]);
        let b = TypeDesc::parameterized(list, vec![TypeDesc::object()]);
        assert!(!Arc::ptr_eq(&a, &b));

        let first = registry.intern(&a);
        let second = registry.intern(&b);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(first.desc(), &a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_variables_intern_by_identity_not_name() {
        let registry = TypeRegistry::new();
        let a = TypeDesc::variable(TypeVarDecl::new("T"));
        let b = TypeDesc::variable(TypeVarDecl::new("T"));
        let ea = registry.intern(&a);
        let eb = registry.intern(&b);
        assert!(!Arc::ptr_eq(&ea, &eb));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_by_class_groups_instantiations_with_raw() {
        let registry = TypeRegistry::new();
        let list = ClassId::new(40);
        registry.intern(&TypeDesc::class(list));
        registry.intern(&TypeDesc::parameterized(
            list,
            vec![TypeDesc::class(Builtin::String.class_id())],
        ));
        registry.intern(&TypeDesc::class(Builtin::String.class_id()));
        assert_eq!(registry.by_class(list).len(), 2);
        assert_eq!(registry.by_class(Builtin::String.class_id()).len(), 1);
    }

    #[test]
    fn test_get_does_not_intern() {
        let registry = TypeRegistry::new();
        let desc = TypeDesc::object();
        assert!(registry.get(&desc).is_none());
        registry.intern(&desc);
        assert!(registry.get(&desc).is_some());
        assert_eq!(registry.len(), 1);
    }
}
