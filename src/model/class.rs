//! Class models and the weak reference that breaks ownership cycles between them.
//!
//! A [`ClassModel`] holds strong references to its property descriptors, and a
//! property's derived element type may point back at the declaring class's own model
//! through the registry. [`ClassModelRef`] is the weak handle used for every such
//! back-edge (registry entries, base-class links), so dropping the owning
//! [`crate::model::builder::TypeModel`] releases the whole graph.

use std::sync::{Arc, OnceLock, Weak};

use crate::{
    model::{
        descriptor::{ClassId, TypeDescRc},
        property::PropertyDescriptor,
    },
    Result,
};

/// Weak handle to a [`ClassModel`], used for back-edges in the model graph.
#[derive(Clone)]
pub struct ClassModelRef {
    target: Weak<ClassModel>,
}

impl ClassModelRef {
    /// Create a weak handle to `model`.
    #[must_use]
    pub fn new(model: &Arc<ClassModel>) -> Self {
        ClassModelRef {
            target: Arc::downgrade(model),
        }
    }

    /// Upgrade to a strong reference, `None` if the owning model was dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<ClassModel>> {
        self.target.upgrade()
    }

    /// True while the referenced model is still alive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl std::fmt::Debug for ClassModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.upgrade() {
            Some(model) => write!(f, "ClassModelRef({})", model.name()),
            None => write!(f, "ClassModelRef(<dropped>)"),
        }
    }
}

/// The binding model of one class: its properties in declaration order and a
/// single-assignment link to the model of its base class.
pub struct ClassModel {
    class: ClassId,
    name: String,
    desc: TypeDescRc,
    properties: Vec<Arc<PropertyDescriptor>>,
    base: OnceLock<ClassModelRef>,
}

impl ClassModel {
    pub(crate) fn new(
        class: ClassId,
        name: String,
        desc: TypeDescRc,
        properties: Vec<Arc<PropertyDescriptor>>,
    ) -> Self {
        ClassModel {
            class,
            name,
            desc,
            properties,
            base: OnceLock::new(),
        }
    }

    /// The class identity this model was built for.
    #[must_use]
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// The fully qualified class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical descriptor of the modeled class.
    #[must_use]
    pub fn desc(&self) -> &TypeDescRc {
        &self.desc
    }

    /// The properties of this class, in declaration order. Inherited properties live
    /// on the base model, not here.
    #[must_use]
    pub fn properties(&self) -> &[Arc<PropertyDescriptor>] {
        &self.properties
    }

    /// Look up an own property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Arc<PropertyDescriptor>> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// The model of the base class, if one exists and is still alive.
    #[must_use]
    pub fn base(&self) -> Option<Arc<ClassModel>> {
        self.base.get().and_then(ClassModelRef::upgrade)
    }

    /// Link the base-class model. Single assignment.
    ///
    /// # Errors
    /// [`crate::Error::ModelUsage`] on a second assignment.
    pub(crate) fn set_base(&self, base: &Arc<ClassModel>) -> Result<()> {
        self.base.set(ClassModelRef::new(base)).map_err(|_| {
            crate::Error::ModelUsage(format!("base of `{}` assigned twice", self.name))
        })
    }
}

impl std::fmt::Debug for ClassModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassModel")
            .field("class", &self.class)
            .field("name", &self.name)
            .field("properties", &self.properties.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::TypeDesc;

    fn empty_model(name: &str) -> Arc<ClassModel> {
        Arc::new(ClassModel::new(
            ClassId::new(50),
            name.to_string(),
            TypeDesc::class(ClassId::new(50)),
            Vec::new(),
        ))
    }

    #[test]
    fn test_weak_ref_releases_with_owner() {
        let model = empty_model("demo.Node");
        let weak = ClassModelRef::new(&model);
        assert!(weak.is_valid());
        assert!(weak.upgrade().is_some());
        drop(model);
        assert!(!weak.is_valid());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_base_is_single_assignment() {
        let model = empty_model("demo.Child");
        let base = empty_model("demo.Parent");
        model.set_base(&base).unwrap();
        assert_eq!(model.base().unwrap().name(), "demo.Parent");
        assert!(model.set_base(&base).is_err());
    }
}
