//! Per-mechanism discovery of dependencies declared directly on a single type. Ancestors are
//! never inspected here - walking the inheritance chain is the job of the
//! [resolver](crate::resolver).
//!
//! Fields are scanned with a two-strategy pipeline: the syntax-level [DeclarationLocator] is
//! asked first, and symbol-level fields from the [TypeSystem] are used when the locator fails or
//! yields nothing for a generic type known to carry marked fields.
//!
//! [DeclarationLocator]: crate::type_system::DeclarationLocator
//! [TypeSystem]: crate::type_system::TypeSystem

pub mod configuration;
pub mod depends_on;
pub mod inject;

use crate::context::AnalysisContext;
use crate::marker::MarkerKind;
use crate::model::{FieldDeclaration, TypeDeclaration};
use crate::type_system::substitutions_for;
use crate::types::TypeRef;
use tracing::debug;

/// A dependency declared on a single type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiscoveredDependency {
    pub service_type: TypeRef,
    pub field_name: String,
    pub is_external: bool,
}

fn has_marked_fields(fields: &[FieldDeclaration]) -> bool {
    fields.iter().any(|field| {
        field.has_marker(MarkerKind::Inject) || field.has_marker(MarkerKind::InjectConfiguration)
    })
}

/// Scans fields of `declaration`, with generic arguments of `ty` substituted.
pub fn scan_fields(
    context: &AnalysisContext,
    declaration: &TypeDeclaration,
    ty: &TypeRef,
) -> Vec<FieldDeclaration> {
    let symbol_fields = || context.type_system.fields(ty);

    match context.locator.locate_fields(declaration) {
        Ok(fields) if fields.is_empty() && declaration.is_generic() => {
            let fields = symbol_fields();
            if has_marked_fields(&fields) {
                debug!(
                    declaration = %declaration.full_name(),
                    "Locator found no fields for a generic type with marked fields - using symbol-level fields."
                );
            }

            fields
        }
        Ok(fields) => {
            let substitutions = substitutions_for(declaration, ty);
            fields
                .into_iter()
                .map(|field| FieldDeclaration {
                    field_type: field
                        .field_type
                        .with_type_parameters(&declaration.type_parameters)
                        .substitute(&substitutions),
                    ..field
                })
                .collect()
        }
        Err(error) => {
            debug!(
                declaration = %declaration.full_name(),
                %error,
                "Cannot scan declaration syntax - using symbol-level fields."
            );
            symbol_fields()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::context::AnalysisContext;
    use crate::discovery::scan_fields;
    use crate::error::LocatorError;
    use crate::generator::GeneratorOptions;
    use crate::model::{AttributeData, FieldDeclaration, TypeDeclaration};
    use crate::type_system::{MockDeclarationLocator, StaticTypeSystem, TypeSystem};
    use crate::types::TypeRef;

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    fn type_system() -> StaticTypeSystem {
        StaticTypeSystem::new(vec![TypeDeclaration {
            type_parameters: vec!["T".to_string()],
            is_partial: true,
            ..TypeDeclaration::new(Some("App"), "Handler")
        }
        .with_field(
            FieldDeclaration::new("_validator", ty("IValidator<T>"))
                .with_attribute(AttributeData::new("Inject")),
        )])
    }

    #[test]
    fn should_fall_back_to_symbols_on_locator_failure() {
        let type_system = type_system();
        let mut locator = MockDeclarationLocator::new();
        locator
            .expect_locate_fields()
            .times(1)
            .returning(|declaration| {
                Err(LocatorError::UnresolvedFragment(declaration.full_name()))
            });

        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &locator, &options);
        let ty = ty("App.Handler<App.Order>");
        let declaration = type_system.declaration(&ty).unwrap();

        let fields = scan_fields(&context, declaration, &ty);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_type, TypeRef::parse("IValidator<App.Order>").unwrap());
    }

    #[test]
    fn should_fall_back_to_symbols_on_empty_generic_scan() {
        let type_system = type_system();
        let mut locator = MockDeclarationLocator::new();
        locator.expect_locate_fields().returning(|_| Ok(vec![]));

        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &locator, &options);
        let ty = ty("App.Handler<App.Order>");
        let declaration = type_system.declaration(&ty).unwrap();

        assert_eq!(scan_fields(&context, declaration, &ty).len(), 1);
    }

    #[test]
    fn should_substitute_located_fields() {
        let type_system = type_system();
        let mut locator = MockDeclarationLocator::new();
        locator.expect_locate_fields().returning(|_| {
            Ok(vec![FieldDeclaration::new(
                "_validator",
                TypeRef::parse("IValidator<T>").unwrap(),
            )])
        });

        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &locator, &options);
        let ty = ty("App.Handler<App.Order>");
        let declaration = type_system.declaration(&ty).unwrap();

        let fields = scan_fields(&context, declaration, &ty);
        assert_eq!(fields[0].field_type, TypeRef::parse("IValidator<App.Order>").unwrap());
    }
}
