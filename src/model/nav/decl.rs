//! Eager navigator backend over explicit declaration tables.
//!
//! [`DeclUniverse`] is the mutable staging area: identities are issued with
//! [`DeclUniverse::declare`] (so mutually recursive classes can reference each other
//! before either is defined), declarations are attached with [`DeclUniverse::define`],
//! and [`DeclUniverse::seal`] freezes the tables into an immutable [`DeclNavigator`].
//! The [`crate::model::descriptor::Builtin`] classes are pre-declared and pre-defined
//! at their fixed identities in every universe.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    model::{
        descriptor::ClassId,
        nav::{builtin_decls, ClassDecl, Navigator},
    },
    Result,
};

/// Mutable staging area for an eager declaration-table universe.
pub struct DeclUniverse {
    names: Vec<String>,
    by_name: HashMap<String, ClassId>,
    decls: Vec<Option<Arc<ClassDecl>>>,
}

impl DeclUniverse {
    /// Create a universe pre-seeded with the builtin classes.
    #[must_use]
    pub fn new() -> Self {
        let mut universe = DeclUniverse {
            names: Vec::new(),
            by_name: HashMap::new(),
            decls: Vec::new(),
        };
        for decl in builtin_decls() {
            let id = universe.declare(&decl.name);
            // seeding cannot conflict: the universe is empty
            universe.define(id, decl).ok();
        }
        universe
    }

    /// Issue an identity for `name`, without a declaration yet.
    ///
    /// Declaring the same name twice returns the same identity, so forward references
    /// between mutually recursive classes resolve naturally.
    pub fn declare(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = ClassId::new(u32::try_from(self.names.len()).unwrap_or(u32::MAX));
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        self.decls.push(None);
        id
    }

    /// Attach the declaration for a previously declared identity.
    ///
    /// # Errors
    /// [`crate::Error::UnknownClass`] if `class` was never issued by this universe;
    /// [`crate::Error::TypeError`] if the identity already carries a declaration or
    /// the declaration's name does not match the declared name.
    pub fn define(&mut self, class: ClassId, decl: ClassDecl) -> Result<()> {
        let index = class.value() as usize;
        let slot = self
            .decls
            .get_mut(index)
            .ok_or(crate::Error::UnknownClass(class))?;
        if slot.is_some() {
            return Err(crate::Error::TypeError(format!(
                "class `{}` defined twice",
                self.names[index]
            )));
        }
        if decl.name != self.names[index] {
            return Err(crate::Error::TypeError(format!(
                "declaration named `{}` attached to identity declared as `{}`",
                decl.name, self.names[index]
            )));
        }
        *slot = Some(Arc::new(decl));
        Ok(())
    }

    /// Freeze the tables into an immutable navigator.
    #[must_use]
    pub fn seal(self) -> DeclNavigator {
        DeclNavigator {
            names: self.names,
            by_name: self.by_name,
            decls: self.decls,
        }
    }
}

impl Default for DeclUniverse {
    fn default() -> Self {
        DeclUniverse::new()
    }
}

/// Eager navigator over the frozen declaration tables of a [`DeclUniverse`].
pub struct DeclNavigator {
    names: Vec<String>,
    by_name: HashMap<String, ClassId>,
    decls: Vec<Option<Arc<ClassDecl>>>,
}

impl Navigator for DeclNavigator {
    fn universe_name(&self) -> &str {
        "decl"
    }

    fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    fn decl_of(&self, class: ClassId) -> Result<Arc<ClassDecl>> {
        let index = class.value() as usize;
        match self.decls.get(index) {
            Some(Some(decl)) => Ok(decl.clone()),
            Some(None) => Err(crate::Error::ClassNotFound(self.names[index].clone())),
            None => Err(crate::Error::UnknownClass(class)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::{Builtin, TypeDesc};
    use crate::model::nav::{FieldDecl, PropertyMarkers};

    #[test]
    fn test_builtins_are_seeded_at_fixed_identities() {
        let universe = DeclUniverse::new();
        let nav = universe.seal();
        assert_eq!(nav.lookup("core.Object"), Some(Builtin::Object.class_id()));
        assert_eq!(
            nav.lookup("core.Collection"),
            Some(Builtin::Collection.class_id())
        );
        assert!(nav.is_interface(Builtin::Collection.class_id()).unwrap());
        assert_eq!(
            nav.type_parameters(Builtin::Collection.class_id())
                .unwrap()
                .len(),
            1
        );
        assert!(nav.superclass(Builtin::Object.class_id()).unwrap().is_none());
    }

    #[test]
    fn test_declare_is_idempotent_per_name() {
        let mut universe = DeclUniverse::new();
        let a = universe.declare("demo.Node");
        let b = universe.declare("demo.Node");
        assert_eq!(a, b);
    }

    #[test]
    fn test_define_rejects_conflicts() {
        let mut universe = DeclUniverse::new();
        let node = universe.declare("demo.Node");
        universe.define(node, ClassDecl::new("demo.Node")).unwrap();

        let again = universe.define(node, ClassDecl::new("demo.Node"));
        assert!(matches!(again, Err(crate::Error::TypeError(_))));

        let other = universe.declare("demo.Other");
        let mismatched = universe.define(other, ClassDecl::new("demo.Wrong"));
        assert!(matches!(mismatched, Err(crate::Error::TypeError(_))));

        let never_issued = universe.define(ClassId::new(9999), ClassDecl::new("demo.Ghost"));
        assert!(matches!(never_issued, Err(crate::Error::UnknownClass(_))));
    }

    #[test]
    fn test_declared_but_undefined_is_class_not_found() {
        let mut universe = DeclUniverse::new();
        let ghost = universe.declare("demo.Ghost");
        let nav = universe.seal();
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
    fn test_fields_round_trip() {
        let mut universe = DeclUniverse::new();
        let node = universe.declare("demo.Node");
        universe
            .define(
                node,
                ClassDecl::new("demo.Node").with_field(FieldDecl::new(
                    "label",
                    TypeDesc::class(Builtin::String.class_id()),
                    PropertyMarkers::empty(),
                )),
            )
            .unwrap();
        let nav = universe.seal();
        let fields = nav.fields(node).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "label");
    }
}
