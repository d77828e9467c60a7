//! Static dependency wiring for declaratively annotated services.
//!
//! Services declare their dependencies with markers: `Inject` fields, class-level `DependsOn`
//! lists and `InjectConfiguration` fields bound from configuration. Instead of resolving such
//! dependencies at runtime, this crate resolves the whole dependency graph ahead of time and
//! produces source code: a constructor for each service class and a single container
//! registration module.
//!
//! The engine works on an abstract view of the analysed program, exposed through the
//! [TypeSystem](type_system::TypeSystem) and
//! [DeclarationLocator](type_system::DeclarationLocator) traits. An in-memory implementation of
//! both, [StaticTypeSystem](type_system::StaticTypeSystem), is built from plain
//! [TypeDeclaration](model::TypeDeclaration)s. The [Generator](generator::Generator) runs all
//! passes over every known declaration:
//!
//! ```
//! use sourcewire_di::generator::{Generator, GeneratorOptions};
//! use sourcewire_di::model::{AttributeData, FieldDeclaration, TypeDeclaration};
//! use sourcewire_di::type_system::StaticTypeSystem;
//! use sourcewire_di::types::TypeRef;
//!
//! let declaration = TypeDeclaration {
//!     is_partial: true,
//!     ..TypeDeclaration::new(Some("App"), "Foo")
//! }
//! .with_field(
//!     FieldDeclaration::new("_logger", TypeRef::parse("ILogger<Foo>").unwrap())
//!         .with_attribute(AttributeData::new("Inject")),
//! );
//!
//! let type_system = StaticTypeSystem::new(vec![declaration]);
//! let options = GeneratorOptions::default();
//! let output = Generator::new(&type_system, &type_system, &options).generate();
//!
//! let constructor = output.source("App.Foo.Constructor.g.cs").unwrap();
//! assert!(constructor.text.contains("public Foo(ILogger<Foo> logger)"));
//! ```
//!
//! Problems found in the analysed program are reported as
//! [Diagnostic](diagnostics::Diagnostic)s and never abort generation of unrelated classes.

pub mod configuration;
pub mod constructor;
pub mod context;
pub mod diagnostics;
pub mod discovery;
pub mod emit;
pub mod error;
pub mod external;
pub mod generator;
pub mod marker;
pub mod model;
pub mod naming;
pub mod registration;
pub mod resolver;
pub mod type_system;
pub mod types;
pub mod validation;
