// Copyright 2025 The bindscope authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # bindscope
//!
//! A framework for building and validating structural *binding models* over introspected
//! type systems. `bindscope` maps type information - classes, fields, methods, generic
//! type parameters, collections - coming from different introspection sources into one
//! unified model describing how object properties relate to a structured external
//! representation, and validates instance graphs against that model.
//!
//! ## Features
//!
//! - **Navigator abstraction** - one contract over arbitrary type universes, with an
//!   eager declaration-table backend and a lazy, cache-backed introspection backend
//! - **Full generics support** - base-class resolution with type-argument substitution,
//!   type-variable binding with structural sharing, erasure, wildcards
//! - **Property model** - collection unwrapping, ID/IDREF identity roles, lazy memoized
//!   derivation of element types
//! - **Interning type registry** - every resolved type is registered exactly once and
//!   linked to the class model that represents it
//! - **Instance-graph validation** - identity-based cycle detection, ID/IDREF
//!   reconciliation, pluggable event handling with abort semantics
//!
//! ## Quick Start
//!
//! ```rust
//! use bindscope::prelude::*;
//! use std::sync::Arc;
//!
//! // Declare a tiny type universe: `Person { id: String, friends: Collection<Person> }`.
//! let mut universe = DeclUniverse::new();
//! let person = universe.declare("demo.Person");
//! universe.define(
//!     person,
//!     ClassDecl::new("demo.Person")
//!         .with_field(FieldDecl::new("id", TypeDesc::class(Builtin::String.class_id()), PropertyMarkers::ID))
//!         .with_field(FieldDecl::new(
//!             "friends",
//!             TypeDesc::parameterized(
//!                 Builtin::Collection.class_id(),
//!                 vec![TypeDesc::class(person)],
//!             ),
//!             PropertyMarkers::empty(),
//!         )),
//! )?;
//!
//! // Build and link the binding model.
//! let builder = ModelBuilder::new(Arc::new(universe.seal()));
//! builder.build_class(person)?;
//! let model = builder.link()?;
//!
//! let class = model.class_named("demo.Person").unwrap();
//! let friends = class.property("friends").unwrap();
//! assert!(friends.is_collection()?);
//! # Ok::<(), bindscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `bindscope` is organized into two module trees:
//!
//! - [`model`] - the type universe, navigators, and the binding-model builder
//! - [`validation`] - instance-graph validation sessions and event delivery
//! - [`Error`] and [`Result`] - comprehensive error handling
//!
//! ### Model construction
//!
//! A [`model::nav::Navigator`] answers structural queries over a type universe. Two
//! implementations exist behind the one trait: [`model::nav::DeclNavigator`] over eager
//! declaration tables, and [`model::nav::ReflectNavigator`] over a lazy
//! [`model::nav::ClassSource`] provider with an instance-owned memoization cache. The
//! [`model::builder::ModelBuilder`] consumes a navigator and produces a linked
//! [`model::builder::TypeModel`] of [`model::class::ClassModel`]s whose
//! [`model::property::PropertyDescriptor`]s lazily derive their collection flag and
//! element type exactly once.
//!
//! ### Validation
//!
//! A [`validation::ValidationSession`] walks an instance graph depth-first, detects
//! cycles by reference identity, collects ID declarations and IDREF references, and
//! reconciles them at the end of the pass. Every reportable condition funnels through
//! one [`validation::EventHandler`]; a rejected report aborts the session.

#[macro_use]
pub(crate) mod error;

pub mod model;
pub mod prelude;
pub mod validation;

pub use error::Error;

/// The result type used throughout bindscope.
pub type Result<T> = std::result::Result<T, Error>;
