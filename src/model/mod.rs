//! The type universe, navigators, and the binding-model builder.
//!
//! This tree contains everything between raw type introspection and the linked
//! binding model:
//!
//! - [`descriptor`]: the five-shape [`descriptor::TypeDesc`] sum type and its
//!   companions ([`descriptor::ClassId`], [`descriptor::TypeVarDecl`],
//!   [`descriptor::Builtin`])
//! - [`nav`]: the [`nav::Navigator`] contract, its two backends, and the structural
//!   traversal algorithms
//! - [`registry`]: the interning [`registry::TypeRegistry`]
//! - [`property`]: [`property::PropertyDescriptor`] and its seeds
//! - [`class`]: [`class::ClassModel`] and the weak [`class::ClassModelRef`]
//! - [`builder`]: [`builder::ModelBuilder`] producing the linked
//!   [`builder::TypeModel`]

pub mod builder;
pub mod class;
pub mod descriptor;
pub mod nav;
pub mod property;
pub mod registry;
