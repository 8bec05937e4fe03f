//! Binding-model construction.
//!
//! A [`ModelBuilder`] consumes a [`Navigator`] and builds [`ClassModel`]s on demand,
//! memoized per class identity, then freezes into an immutable [`TypeModel`] through
//! [`ModelBuilder::link`]. Construction follows a strict order so that mutually
//! recursive classes terminate: a class's model is published to the memo table
//! *before* its base class is built, and lazy property derivations (element types)
//! stay locked until the link step flips the shared context to linked.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use dashmap::DashMap;

use crate::{
    model::{
        class::ClassModel,
        descriptor::{Builtin, ClassId, TypeDesc},
        nav::{visitor::MAX_HIERARCHY_DEPTH, Navigator, PropertyMarkers},
        property::{AccessorSeed, FieldSeed, PropertyDescriptor},
        registry::TypeRegistry,
    },
    Result,
};

/// Shared state between a model and its property descriptors: the navigator, the
/// interning registry, and the linked flag gating lazy derivations.
pub(crate) struct ModelContext {
    nav: Arc<dyn Navigator>,
    registry: TypeRegistry,
    linked: AtomicBool,
}

impl ModelContext {
    pub(crate) fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.nav
    }

    pub(crate) fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub(crate) fn is_linked(&self) -> bool {
        self.linked.load(Ordering::Acquire)
    }
}

/// Builds class models over one navigator, then links them into a [`TypeModel`].
pub struct ModelBuilder {
    ctx: Arc<ModelContext>,
    classes: DashMap<ClassId, Arc<ClassModel>>,
    order: boxcar::Vec<ClassId>,
}

impl ModelBuilder {
    /// Create a builder over `nav` with a fresh registry.
    #[must_use]
    pub fn new(nav: Arc<dyn Navigator>) -> Self {
        ModelBuilder {
            ctx: Arc::new(ModelContext {
                nav,
                registry: TypeRegistry::new(),
                linked: AtomicBool::new(false),
            }),
            classes: DashMap::new(),
            order: boxcar::Vec::new(),
        }
    }

    /// Build (or return the memoized) model for `class`, including the transitive
    /// models of its non-builtin base classes.
    ///
    /// Building the same class twice returns the same model instance.
    pub fn build_class(&self, class: ClassId) -> Result<Arc<ClassModel>> {
        self.build_inner(class, 0)
    }

    /// Build the model for the class named `name`.
    ///
    /// # Errors
    /// [`crate::Error::ClassNotFound`] when the navigator knows no such name.
    pub fn build_named(&self, name: &str) -> Result<Arc<ClassModel>> {
        let class = self
            .ctx
            .nav
            .lookup(name)
            .ok_or_else(|| crate::Error::ClassNotFound(name.to_string()))?;
        self.build_class(class)
    }

    fn build_inner(&self, class: ClassId, depth: usize) -> Result<Arc<ClassModel>> {
        if let Some(existing) = self.classes.get(&class) {
            return Ok(existing.clone());
        }
        if depth > MAX_HIERARCHY_DEPTH {
            return Err(crate::Error::RecursionLimit(MAX_HIERARCHY_DEPTH));
        }

        let decl = self.ctx.nav.decl_of(class)?;
        let properties = self.derive_properties(&decl)?;
        let canonical = self
            .ctx
            .registry
            .intern(&TypeDesc::class(class))
            .desc()
            .clone();
        let model = Arc::new(ClassModel::new(
            class,
            decl.name.clone(),
            canonical.clone(),
            properties,
        ));

        // published before the base is built, so cyclic hierarchies terminate
        self.classes.insert(class, model.clone());
        self.order.push(class);
        self.ctx.registry.intern(&canonical).link_model(&model)?;

        if let Some(sc) = &decl.superclass {
            if let Some(raw) = self.ctx.nav.erasure_class(sc)? {
                if Builtin::from_class(raw).is_none() {
                    let base = self.build_inner(raw, depth + 1)?;
                    model.set_base(&base)?;
                }
            }
        }

        Ok(model)
    }

    /// Derive property descriptors from a declaration: instance fields first in
    /// declaration order, then accessor pairs that do not shadow a field property.
    fn derive_properties(
        &self,
        decl: &crate::model::nav::ClassDecl,
    ) -> Result<Vec<Arc<PropertyDescriptor>>> {
        let mut properties: Vec<Arc<PropertyDescriptor>> = Vec::new();

        for field in &decl.fields {
            if field
                .markers
                .intersects(PropertyMarkers::STATIC | PropertyMarkers::TRANSIENT)
            {
                continue;
            }
            let seed = FieldSeed::new(field.clone());
            properties.push(Arc::new(PropertyDescriptor::from_seed(
                &seed,
                self.ctx.clone(),
            )));
        }

        for method in &decl.methods {
            let Some(prop_name) = method.name.strip_prefix("get_") else {
                continue;
            };
            if !method.params.is_empty() {
                continue;
            }
            if properties.iter().any(|p| p.name() == prop_name) {
                continue;
            }
            let setter_name = format!("set_{prop_name}");
            let setter = decl
                .methods
                .iter()
                .find(|m| m.name == setter_name && m.params.len() == 1);
            let markers = method.markers | setter.map_or(PropertyMarkers::empty(), |s| s.markers);
            if markers.intersects(PropertyMarkers::STATIC | PropertyMarkers::TRANSIENT) {
                continue;
            }
            let seed = AccessorSeed::new(prop_name, method.return_ty.clone(), markers);
            properties.push(Arc::new(PropertyDescriptor::from_seed(
                &seed,
                self.ctx.clone(),
            )));
        }

        Ok(properties)
    }

    /// Freeze the built models into an immutable [`TypeModel`] and unlock lazy
    /// property derivations.
    pub fn link(self) -> Result<TypeModel> {
        self.ctx.linked.store(true, Ordering::Release);
        let mut classes = Vec::with_capacity(self.order.count());
        for (_, class) in self.order.iter() {
            if let Some(model) = self.classes.get(class) {
                classes.push(model.clone());
            }
        }
        Ok(TypeModel {
            ctx: self.ctx,
            classes,
        })
    }
}

/// The linked, immutable binding model.
pub struct TypeModel {
    ctx: Arc<ModelContext>,
    classes: Vec<Arc<ClassModel>>,
}

impl TypeModel {
    /// All built class models, in build order.
    #[must_use]
    pub fn classes(&self) -> &[Arc<ClassModel>] {
        &self.classes
    }

    /// Look up a built class model by its fully qualified name.
    #[must_use]
    pub fn class_named(&self, name: &str) -> Option<Arc<ClassModel>> {
        self.classes.iter().find(|m| m.name() == name).cloned()
    }

    /// The interning registry shared by every model and property.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.ctx.registry
    }

    /// The navigator the model was built over.
    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.ctx.nav
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::nav::{ClassDecl, DeclUniverse, FieldDecl, MethodDecl};

    fn person_universe() -> (Arc<dyn Navigator>, ClassId) {
        let mut universe = DeclUniverse::new();
        let person = universe.declare("demo.Person");
        universe
            .define(
                person,
                ClassDecl::new("demo.Person")
                    .with_field(FieldDecl::new(
                        "id",
                        TypeDesc::class(Builtin::String.class_id()),
                        PropertyMarkers::ID,
                    ))
                    .with_field(FieldDecl::new(
                        "cache",
                        TypeDesc::object(),
                        PropertyMarkers::TRANSIENT,
                    ))
                    .with_method(MethodDecl::new(
                        "get_age",
                        TypeDesc::class(Builtin::Int32.class_id()),
                    ))
                    .with_method(
                        MethodDecl::new("set_age", TypeDesc::object())
                            .with_param(TypeDesc::class(Builtin::Int32.class_id())),
                    )
                    .with_method(MethodDecl::new(
                        "get_id",
                        TypeDesc::class(Builtin::String.class_id()),
                    )),
            )
            .unwrap();
        (Arc::new(universe.seal()), person)
    }

    #[test]
    fn test_field_and_accessor_properties() {
        let (nav, person) = person_universe();
        let builder = ModelBuilder::new(nav);
        let model = builder.build_class(person).unwrap();
        let names: Vec<&str> = model.properties().iter().map(|p| p.name()).collect();
        // transient field skipped; get_id shadowed by the id field; get_age paired
        assert_eq!(names, vec!["id", "age"]);
    }

    #[test]
    fn test_build_is_memoized() {
        let (nav, person) = person_universe();
        let builder = ModelBuilder::new(nav);
        let first = builder.build_class(person).unwrap();
        let second = builder.build_class(person).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_link_unlocks_element_types() {
        let (nav, person) = person_universe();
        let builder = ModelBuilder::new(nav);
        let model = builder.build_class(person).unwrap();
        let id = model.property("id").unwrap().clone();
        assert!(matches!(
            id.element_type(),
            Err(crate::Error::ModelUsage(_))
        ));

        let linked = builder.link().unwrap();
        let id = linked.class_named("demo.Person").unwrap();
        let id = id.property("id").unwrap().clone();
        let element = id.element_type().unwrap();
        assert_eq!(element.as_class(), Some(Builtin::String.class_id()));
    }
}
