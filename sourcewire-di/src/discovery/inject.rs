use crate::context::AnalysisContext;
use crate::discovery::DiscoveredDependency;
use crate::external::is_external_dependency;
use crate::marker::MarkerKind;
use crate::model::FieldDeclaration;

/// Instance fields carrying the `Inject` marker. Static and const fields are never injected.
pub fn inject_dependencies(
    context: &AnalysisContext,
    fields: &[FieldDeclaration],
) -> Vec<DiscoveredDependency> {
    fields
        .iter()
        .filter(|field| field.is_instance() && field.has_marker(MarkerKind::Inject))
        .map(|field| DiscoveredDependency {
            service_type: field.field_type.clone(),
            field_name: field.name.clone(),
            is_external: is_external_dependency(
                context,
                &field.field_type,
                field.has_marker(MarkerKind::ExternalService),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::context::AnalysisContext;
    use crate::discovery::inject::inject_dependencies;
    use crate::generator::GeneratorOptions;
    use crate::model::{AttributeData, FieldDeclaration};
    use crate::type_system::StaticTypeSystem;
    use crate::types::TypeRef;

    #[test]
    fn should_discover_instance_inject_fields() {
        let type_system = StaticTypeSystem::default();
        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &type_system, &options);

        let fields = vec![
            FieldDeclaration::new("_logger", TypeRef::parse("ILogger<Foo>").unwrap())
                .with_attribute(AttributeData::new("Inject")),
            FieldDeclaration::new("_clock", TypeRef::parse("IClock").unwrap())
                .with_attribute(AttributeData::new("InjectAttribute"))
                .with_attribute(AttributeData::new("ExternalService")),
            FieldDeclaration::new("_timeout", TypeRef::parse("int").unwrap())
                .with_attribute(AttributeData::new("InjectConfiguration")),
            FieldDeclaration {
                is_static: true,
                ..FieldDeclaration::new("_shared", TypeRef::parse("ICache").unwrap())
                    .with_attribute(AttributeData::new("Inject"))
            },
        ];

        let dependencies = inject_dependencies(&context, &fields);
        assert_eq!(dependencies.len(), 2);
        assert_eq!(dependencies[0].field_name, "_logger");
        assert!(!dependencies[0].is_external);
        assert!(dependencies[1].is_external);
    }
}
