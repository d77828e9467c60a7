//! Classification of externally supplied dependencies.

use crate::context::AnalysisContext;
use crate::marker::MarkerKind;
use crate::types::TypeRef;

/// Decides if a dependency is supplied outside the generated code. Deferred construction
/// wrappers and nullable types are never external, regardless of markers.
pub fn is_external_dependency(
    context: &AnalysisContext,
    service_type: &TypeRef,
    explicitly_external: bool,
) -> bool {
    if service_type.is_nullable() || service_type.is_deferred_wrapper() {
        return false;
    }

    if explicitly_external {
        return true;
    }

    let type_system = context.type_system;
    type_system
        .declaration(service_type)
        .map(|declaration| declaration.has_marker(MarkerKind::ExternalService))
        .unwrap_or(false)
        || type_system
            .implementations(service_type)
            .iter()
            .any(|implementation| implementation.has_marker(MarkerKind::ExternalService))
}

#[cfg(test)]
mod tests {
    use crate::context::AnalysisContext;
    use crate::external::is_external_dependency;
    use crate::generator::GeneratorOptions;
    use crate::model::{AttributeData, TypeDeclaration, TypeKind};
    use crate::type_system::StaticTypeSystem;
    use crate::types::TypeRef;

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    #[test]
    fn should_detect_external_implementations() {
        let type_system = StaticTypeSystem::new(vec![
            TypeDeclaration {
                kind: TypeKind::Interface,
                ..TypeDeclaration::new(Some("App"), "IClock")
            },
            TypeDeclaration {
                interfaces: vec![ty("App.IClock")],
                ..TypeDeclaration::new(Some("App"), "SystemClock")
            }
            .with_attribute(AttributeData::new("ExternalService")),
            TypeDeclaration {
                kind: TypeKind::Interface,
                ..TypeDeclaration::new(Some("App"), "IMailer")
            },
        ]);
        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &type_system, &options);

        assert!(is_external_dependency(&context, &ty("App.IClock"), false));
        assert!(!is_external_dependency(&context, &ty("App.IMailer"), false));
        assert!(is_external_dependency(&context, &ty("App.IMailer"), true));
        assert!(!is_external_dependency(&context, &ty("App.IClock?"), true));
        assert!(!is_external_dependency(&context, &ty("Lazy<App.IClock>"), true));
    }
}
