use crate::context::AnalysisContext;
use crate::discovery::DiscoveredDependency;
use crate::external::is_external_dependency;
use crate::marker::{DependsOnAttributes, MarkerKind};
use crate::model::TypeDeclaration;
use crate::naming::depends_on_field_name;
use crate::type_system::substitutions_for;
use crate::types::TypeRef;
use tracing::debug;

/// Dependencies listed by `DependsOn<T...>` markers, with generated field names. Malformed
/// markers are skipped - they are reported during validation.
pub fn depends_on_dependencies(
    context: &AnalysisContext,
    declaration: &TypeDeclaration,
    ty: &TypeRef,
) -> Vec<DiscoveredDependency> {
    let substitutions = substitutions_for(declaration, ty);

    declaration
        .markers(MarkerKind::DependsOn)
        .filter_map(|marker| match DependsOnAttributes::try_from(marker) {
            Ok(attributes) => Some(attributes),
            Err(error) => {
                debug!(declaration = %declaration.full_name(), %error, "Skipping malformed marker.");
                None
            }
        })
        .flat_map(|attributes| {
            let naming = attributes.naming(&context.options.naming);
            attributes
                .types
                .iter()
                .map(|service_type| {
                    let service_type = service_type.substitute(&substitutions);
                    DiscoveredDependency {
                        field_name: depends_on_field_name(&service_type, &naming),
                        is_external: is_external_dependency(
                            context,
                            &service_type,
                            attributes.external,
                        ),
                        service_type,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::context::AnalysisContext;
    use crate::discovery::depends_on::depends_on_dependencies;
    use crate::generator::GeneratorOptions;
    use crate::model::{AttributeData, AttributeValue, TypeDeclaration};
    use crate::type_system::{StaticTypeSystem, TypeSystem};
    use crate::types::TypeRef;

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    #[test]
    fn should_name_and_substitute_depends_on_types() {
        let type_system = StaticTypeSystem::new(vec![TypeDeclaration {
            type_parameters: vec!["T".to_string()],
            ..TypeDeclaration::new(Some("App"), "Processor")
        }
        .with_attribute(
            AttributeData::new("DependsOn")
                .with_type_arguments(vec![ty("IRepository<T>"), ty("IEnumerable<IHandler1>")]),
        )
        .with_attribute(
            AttributeData::new("DependsOn")
                .with_type_arguments(vec![ty("IClock")])
                .with_named_argument("External", AttributeValue::Bool(true))
                .with_named_argument("Prefix", AttributeValue::Str(String::new())),
        )]);
        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &type_system, &options);
        let processor = ty("App.Processor<App.Order>");

        let dependencies = depends_on_dependencies(
            &context,
            type_system.declaration(&processor).unwrap(),
            &processor,
        );

        assert_eq!(dependencies.len(), 3);
        assert_eq!(dependencies[0].service_type, ty("IRepository<App.Order>"));
        assert_eq!(dependencies[0].field_name, "_repository");
        assert_eq!(dependencies[1].field_name, "_handlers");
        assert_eq!(dependencies[2].field_name, "clock");
        assert!(dependencies[2].is_external);
    }
}
