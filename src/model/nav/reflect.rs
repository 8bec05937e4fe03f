//! Lazy navigator backend over an introspection provider.
//!
//! A [`ReflectNavigator`] issues class identities on demand and asks its
//! [`ClassSource`] for declarations only when one is first needed; the produced
//! declaration is memoized in an instance-owned cache, so the source is consulted at
//! most once per class. The provider receives the navigator back so that declarations
//! it produces can intern the identities of referenced classes through
//! [`ReflectNavigator::class_id`].

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    model::{
        descriptor::ClassId,
        nav::{builtin_decls, ClassDecl, Navigator},
    },
    Result,
};

/// Provider of class declarations for a [`ReflectNavigator`].
///
/// `introspect` is called at most once per class name; returning `None` means the
/// backing source has no such class, which the navigator reports as
/// [`crate::Error::ClassNotFound`].
pub trait ClassSource: Send + Sync {
    /// Produce the declaration for `name`, interning referenced classes through `nav`.
    fn introspect(&self, name: &str, nav: &ReflectNavigator) -> Option<ClassDecl>;
}

/// Lazy navigator backed by a [`ClassSource`] with a memoization cache.
pub struct ReflectNavigator {
    source: Arc<dyn ClassSource>,
    names: boxcar::Vec<String>,
    by_name: DashMap<String, ClassId>,
    decls: DashMap<ClassId, Arc<ClassDecl>>,
}

impl ReflectNavigator {
    /// Create a navigator over `source`, pre-seeded with the builtin classes.
    #[must_use]
    pub fn new(source: Arc<dyn ClassSource>) -> Self {
        let nav = ReflectNavigator {
            source,
            names: boxcar::Vec::new(),
            by_name: DashMap::new(),
            decls: DashMap::new(),
        };
        for decl in builtin_decls() {
            let id = nav.class_id(&decl.name);
            nav.decls.insert(id, Arc::new(decl));
        }
        nav
    }

    /// Intern `name`, issuing a fresh identity on first sight.
    ///
    /// Interning never consults the source; the declaration stays unresolved until
    /// something asks for it.
    pub fn class_id(&self, name: &str) -> ClassId {
        *self.by_name.entry(name.to_string()).or_insert_with(|| {
            let index = self.names.push(name.to_string());
            ClassId::new(u32::try_from(index).unwrap_or(u32::MAX))
        })
    }

    /// Number of classes introspected so far.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.decls.len()
    }
}

impl Navigator for ReflectNavigator {
    fn universe_name(&self) -> &str {
        "reflect"
    }

    fn lookup(&self, name: &str) -> Option<ClassId> {
        Some(self.class_id(name))
    }

    fn decl_of(&self, class: ClassId) -> Result<Arc<ClassDecl>> {
        if let Some(decl) = self.decls.get(&class) {
            return Ok(decl.clone());
        }
        let name = self
            .names
            .get(class.value() as usize)
            .ok_or(crate::Error::UnknownClass(class))?;
        let decl = self
            .source
            .introspect(name, self)
            .map(Arc::new)
            .ok_or_else(|| crate::Error::ClassNotFound(name.clone()))?;
        // a concurrent introspection of the same class keeps the first entry
        Ok(self
            .decls
            .entry(class)
            .or_insert(decl)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::model::descriptor::{Builtin, TypeDesc};
    use crate::model::nav::{FieldDecl, PropertyMarkers};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl ClassSource for CountingSource {
        fn introspect(&self, name: &str, nav: &ReflectNavigator) -> Option<ClassDecl> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match name {
                "demo.Node" => Some(
                    ClassDecl::new("demo.Node").with_field(FieldDecl::new(
                        "next",
                        TypeDesc::class(nav.class_id("demo.Node")),
                        PropertyMarkers::empty(),
                    )),
                ),
                _ => None,
            }
        }
    }

    fn counting_nav() -> (ReflectNavigator, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        (ReflectNavigator::new(source.clone()), source)
    }

    #[test]
    fn test_interning_is_idempotent() {
        let (nav, source) = counting_nav();
        let a = nav.class_id("demo.Node");
        let b = nav.class_id("demo.Node");
        assert_eq!(a, b);
        // interning alone never introspects
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_introspection_is_memoized() {
        let (nav, source) = counting_nav();
        let node = nav.class_id("demo.Node");
        let first = nav.decl_of(node).unwrap();
        let second = nav.decl_of(node).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_class_is_reported_by_name() {
        let (nav, _) = counting_nav();
        let ghost = nav.class_id("demo.Ghost");
        assert!(matches!(
            nav.decl_of(ghost),
            Err(crate::Error::ClassNotFound(name)) if name == "demo.Ghost"
        ));
        assert!(matches!(
            nav.decl_of(ClassId::new(9999)),
            Err(crate::Error::UnknownClass(_))
        ));
    }

    #[test]
    fn test_builtins_are_pre_resolved() {
        let (nav, source) = counting_nav();
        let decl = nav.decl_of(Builtin::Collection.class_id()).unwrap();
        assert_eq!(decl.name, "core.Collection");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
