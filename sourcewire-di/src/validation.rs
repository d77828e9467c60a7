//! Structural validation of analysed declarations:
//!
//! * declaration shape - problems preventing constructor generation for a class
//! * marker combinations - markers which make no sense together or with the class
//! * dependency graph - missing or unregistered implementations, lifetime violations and cycles

use crate::context::AnalysisContext;
use crate::diagnostics::{
    Diagnostic, CIRCULAR_DEPENDENCY, CONDITIONAL_WITHOUT_LIFETIME, CONFLICTING_CONDITIONS,
    DEPENDS_ON_ALREADY_INJECTED, DUPLICATE_DEPENDS_ON, MALFORMED_CONFIGURATION_KEY,
    MALFORMED_MARKER, MISSING_IMPLEMENTATION, NON_PARTIAL_CLASS, REGISTER_AS_NOT_IMPLEMENTED,
    SINGLETON_DEPENDS_ON_SCOPED, SINGLETON_DEPENDS_ON_TRANSIENT, SKIP_NOT_IMPLEMENTED,
    SKIP_WITHOUT_REGISTER_AS_ALL, STATIC_INJECTED_FIELD, UNREGISTERED_IMPLEMENTATION,
    UNSUPPORTED_CONFIGURATION_TYPE,
};
use crate::discovery::configuration::configuration_fields;
use crate::error::AttributeError;
use crate::marker::{
    ConfigurationAttributes, DependsOnAttributes, Lifetime, MarkerKind, RegisterAsAllAttributes,
    RegisterAsAttributes, SkipRegistrationAttributes,
};
use crate::model::{AttributeData, TypeDeclaration};
use crate::registration::conditional::Condition;
use crate::registration::{implements, ClassRegistrations};
use crate::resolver::{constructor_dependencies, resolve_dependencies, DependencySource};
use crate::types::TypeRef;
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;

/// Well-known framework services which are never declared in analysed code.
const FRAMEWORK_SERVICE_NAMES: &[&str] = &[
    "ILogger",
    "ILoggerFactory",
    "IConfiguration",
    "IServiceProvider",
    "IServiceScopeFactory",
    "IHostEnvironment",
    "IWebHostEnvironment",
    "IHostApplicationLifetime",
    "IHttpClientFactory",
    "HttpClient",
    "IMemoryCache",
    "IDistributedCache",
    "TimeProvider",
];

fn is_framework_type(ty: &TypeRef) -> bool {
    match ty.namespace() {
        Some(namespace) => {
            namespace == "System"
                || namespace.starts_with("System.")
                || namespace.starts_with("Microsoft.")
        }
        None => FRAMEWORK_SERVICE_NAMES.contains(&ty.simple_name()),
    }
}

/// Problems which prevent generating a constructor for the declaration.
pub fn declaration_shape(declaration: &TypeDeclaration) -> Vec<Diagnostic> {
    let location = declaration.full_name();
    let name = declaration.display_name();
    let mut diagnostics = vec![];

    if declaration.has_injection_markers() && !declaration.is_partial {
        diagnostics.push(Diagnostic::new(&NON_PARTIAL_CLASS, &location, &[&name]));
    }

    diagnostics.extend(
        declaration
            .fields
            .iter()
            .filter(|field| field.is_static)
            .filter(|field| {
                field.has_marker(MarkerKind::Inject)
                    || field.has_marker(MarkerKind::InjectConfiguration)
            })
            .map(|field| Diagnostic::new(&STATIC_INJECTED_FIELD, &location, &[&name, &field.name])),
    );

    for info in configuration_fields(&declaration.fields) {
        if let Some(problem) = info.key_problem() {
            diagnostics.push(Diagnostic::new(
                &MALFORMED_CONFIGURATION_KEY,
                &location,
                &[&name, &info.field_name, problem.describe()],
            ));
        }

        if !info.is_supported_type() {
            diagnostics.push(Diagnostic::new(
                &UNSUPPORTED_CONFIGURATION_TYPE,
                &location,
                &[&name, &info.field_name, &info.field_type.to_string()],
            ));
        }
    }

    diagnostics
}

fn check_marker<T>(
    attribute: &AttributeData,
    location: &str,
    name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<T>
where
    T: for<'a> TryFrom<&'a AttributeData, Error = AttributeError>,
{
    match T::try_from(attribute) {
        Ok(value) => Some(value),
        Err(error) => {
            diagnostics.push(Diagnostic::new(
                &MALFORMED_MARKER,
                location,
                &[name, &error.to_string()],
            ));
            None
        }
    }
}

/// Marker combinations which are contradictory or ineffective.
pub fn marker_combinations(
    context: &AnalysisContext,
    declaration: &TypeDeclaration,
) -> Vec<Diagnostic> {
    let location = declaration.full_name();
    let name = declaration.display_name();
    let class = declaration.self_type();
    let mut diagnostics = vec![];

    for field in &declaration.fields {
        if let Some(marker) = field.marker(MarkerKind::InjectConfiguration) {
            check_marker::<ConfigurationAttributes>(marker, &location, &name, &mut diagnostics);
        }
    }

    let depends_on_types = declaration
        .markers(MarkerKind::DependsOn)
        .filter_map(|marker| {
            check_marker::<DependsOnAttributes>(marker, &location, &name, &mut diagnostics)
        })
        .flat_map(|attributes| attributes.types)
        .collect_vec();

    for duplicate in depends_on_types.iter().duplicates() {
        diagnostics.push(Diagnostic::new(
            &DUPLICATE_DEPENDS_ON,
            &location,
            &[&name, &duplicate.to_string()],
        ));
    }

    for service_type in depends_on_types.iter().unique() {
        if let Some(field) = declaration.fields.iter().find(|field| {
            field.has_marker(MarkerKind::Inject) && field.field_type == *service_type
        }) {
            diagnostics.push(Diagnostic::new(
                &DEPENDS_ON_ALREADY_INJECTED,
                &location,
                &[&name, &service_type.to_string(), &field.name],
            ));
        }
    }

    let conditions = declaration
        .markers(MarkerKind::ConditionalService)
        .filter_map(|marker| check_marker::<Condition>(marker, &location, &name, &mut diagnostics))
        .collect_vec();

    let has_lifetime = declaration.has_marker(MarkerKind::BackgroundService)
        || declaration
            .attributes
            .iter()
            .any(|attribute| attribute.marker().and_then(MarkerKind::lifetime).is_some());

    if !conditions.is_empty() && !has_lifetime {
        diagnostics.push(Diagnostic::new(&CONDITIONAL_WITHOUT_LIFETIME, &location, &[&name]));
    }

    for conflict in conditions.iter().filter_map(Condition::conflict) {
        diagnostics.push(Diagnostic::new(
            &CONFLICTING_CONDITIONS,
            &location,
            &[&name, &conflict],
        ));
    }

    for marker in declaration.markers(MarkerKind::RegisterAsAll) {
        check_marker::<RegisterAsAllAttributes>(marker, &location, &name, &mut diagnostics);
    }

    let registered_as = declaration
        .markers(MarkerKind::RegisterAs)
        .filter_map(|marker| {
            check_marker::<RegisterAsAttributes>(marker, &location, &name, &mut diagnostics)
        })
        .flat_map(|attributes| attributes.types)
        .collect_vec();

    for service_type in registered_as
        .iter()
        .filter(|service_type| !implements(context, &class, service_type))
    {
        diagnostics.push(Diagnostic::new(
            &REGISTER_AS_NOT_IMPLEMENTED,
            &location,
            &[&name, &service_type.to_string()],
        ));
    }

    let skipped = declaration
        .markers(MarkerKind::SkipRegistration)
        .filter_map(|marker| {
            check_marker::<SkipRegistrationAttributes>(marker, &location, &name, &mut diagnostics)
        })
        .flat_map(|attributes| attributes.types)
        .collect_vec();

    if !skipped.is_empty() && !declaration.has_marker(MarkerKind::RegisterAsAll) {
        diagnostics.push(Diagnostic::new(&SKIP_WITHOUT_REGISTER_AS_ALL, &location, &[&name]));
    }

    for service_type in skipped
        .iter()
        .filter(|service_type| !implements(context, &class, service_type))
    {
        diagnostics.push(Diagnostic::new(
            &SKIP_NOT_IMPLEMENTED,
            &location,
            &[&name, &service_type.to_string()],
        ));
    }

    diagnostics
}

struct CycleFinder<'a> {
    edges: &'a FxHashMap<&'a str, Vec<&'a str>>,
    visiting: Vec<&'a str>,
    finished: FxHashSet<&'a str>,
    cycles: Vec<Vec<&'a str>>,
}

impl<'a> CycleFinder<'a> {
    fn visit(&mut self, node: &'a str) {
        if self.finished.contains(node) {
            return;
        }

        if let Some(position) = self.visiting.iter().position(|visiting| *visiting == node) {
            let mut cycle = self.visiting[position..].to_vec();

            // canonical rotation, so each cycle is reported once
            if let Some(start) = cycle.iter().position_min() {
                cycle.rotate_left(start);
            }

            if !self.cycles.contains(&cycle) {
                self.cycles.push(cycle);
            }

            return;
        }

        self.visiting.push(node);
        if let Some(targets) = self.edges.get(node) {
            for target in targets {
                self.visit(*target);
            }
        }
        self.visiting.pop();
        self.finished.insert(node);
    }
}

/// Validates the dependency graph formed by registered services.
pub fn dependency_graph(
    context: &AnalysisContext,
    classes: &[ClassRegistrations],
) -> Vec<Diagnostic> {
    let classes = classes
        .iter()
        .sorted_by(|first, second| first.class_name.cmp(&second.class_name))
        .collect_vec();

    let mut providers: FxHashMap<String, Vec<&ClassRegistrations>> = FxHashMap::default();
    for class in &classes {
        for key in class.service_types().filter_map(TypeRef::key).unique() {
            providers.entry(key).or_default().push(*class);
        }
    }

    let mut diagnostics = vec![];
    let mut edges: FxHashMap<&str, Vec<&str>> = FxHashMap::default();

    for class in &classes {
        let name = class.class.to_string();
        let dependencies =
            constructor_dependencies(&resolve_dependencies(context, &class.class).all_dependencies);

        for dependency in dependencies {
            if dependency.is_external || dependency.source == DependencySource::ConfigurationInjection
            {
                continue;
            }

            let service_type = dependency.service_type.unwrap_nullable();
            if matches!(service_type, TypeRef::Parameter(_))
                || service_type.is_deferred_wrapper()
                || service_type.is_collection()
                || is_framework_type(service_type)
            {
                continue;
            }

            let dependency_name = service_type.to_string();
            match service_type.key().and_then(|key| providers.get(&key)) {
                Some(implementations) => {
                    for implementation in implementations {
                        if class.lifetime.is_process_wide() {
                            match implementation.lifetime {
                                Lifetime::Scoped => diagnostics.push(Diagnostic::new(
                                    &SINGLETON_DEPENDS_ON_SCOPED,
                                    &class.class_name,
                                    &[&name, &dependency_name],
                                )),
                                Lifetime::Transient => diagnostics.push(Diagnostic::new(
                                    &SINGLETON_DEPENDS_ON_TRANSIENT,
                                    &class.class_name,
                                    &[&name, &dependency_name],
                                )),
                                _ => {}
                            }
                        }

                        edges
                            .entry(class.class_name.as_str())
                            .or_default()
                            .push(implementation.class_name.as_str());
                    }
                }
                None if context.type_system.declaration(service_type).is_some() => {
                    let has_implementations = context
                        .type_system
                        .implementations(service_type)
                        .iter()
                        .any(|implementation| !implementation.is_abstract);

                    let descriptor = if has_implementations {
                        &UNREGISTERED_IMPLEMENTATION
                    } else {
                        &MISSING_IMPLEMENTATION
                    };

                    diagnostics.push(Diagnostic::new(
                        descriptor,
                        &class.class_name,
                        &[&name, &dependency_name],
                    ));
                }
                None => {}
            }
        }
    }

    let mut finder = CycleFinder {
        edges: &edges,
        visiting: vec![],
        finished: FxHashSet::default(),
        cycles: vec![],
    };

    for class in &classes {
        finder.visit(class.class_name.as_str());
    }

    for cycle in &finder.cycles {
        let path = cycle
            .iter()
            .chain(cycle.first())
            .join(" -> ");
        diagnostics.push(Diagnostic::new(&CIRCULAR_DEPENDENCY, cycle[0], &[&path]));
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use crate::context::AnalysisContext;
    use crate::generator::GeneratorOptions;
    use crate::model::{AttributeData, AttributeValue, FieldDeclaration, TypeDeclaration, TypeKind};
    use crate::registration::class_registrations;
    use crate::type_system::{StaticTypeSystem, TypeSystem};
    use crate::types::TypeRef;
    use crate::validation::{declaration_shape, dependency_graph, marker_combinations};

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    fn ids(diagnostics: &[crate::diagnostics::Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|diagnostic| diagnostic.id()).collect()
    }

    fn interface(name: &str) -> TypeDeclaration {
        TypeDeclaration {
            kind: TypeKind::Interface,
            ..TypeDeclaration::new(Some("App"), name)
        }
    }

    fn service(name: &str, lifetime: &str, interfaces: &[&str]) -> TypeDeclaration {
        TypeDeclaration {
            is_partial: true,
            interfaces: interfaces.iter().map(|name| ty(name)).collect(),
            ..TypeDeclaration::new(Some("App"), name)
        }
        .with_attribute(AttributeData::new(lifetime))
    }

    fn inject(name: &str, field_type: &str) -> FieldDeclaration {
        FieldDeclaration::new(name, ty(field_type)).with_attribute(AttributeData::new("Inject"))
    }

    fn graph_diagnostics(declarations: Vec<TypeDeclaration>) -> Vec<String> {
        let type_system = StaticTypeSystem::new(declarations);
        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &type_system, &options);
        let classes: Vec<_> = type_system
            .declarations()
            .into_iter()
            .filter_map(|declaration| class_registrations(&context, declaration))
            .collect();

        dependency_graph(&context, &classes)
            .into_iter()
            .map(|diagnostic| diagnostic.id().to_string())
            .collect()
    }

    #[test]
    fn should_report_shape_problems() {
        let declaration = TypeDeclaration::new(Some("App"), "Service")
            .with_field(inject("_repo", "IRepo"))
            .with_field(FieldDeclaration {
                is_static: true,
                ..inject("_shared", "ICache")
            })
            .with_field(
                FieldDeclaration::new("_timeout", ty("int"))
                    .with_attribute(AttributeData::new("InjectConfiguration")),
            )
            .with_field(
                FieldDeclaration::new("_factory", ty("Func<int>")).with_attribute(
                    AttributeData::new("InjectConfiguration")
                        .with_argument(AttributeValue::Str("Factory".to_string())),
                ),
            );

        assert_eq!(
            ids(&declaration_shape(&declaration)),
            vec!["SW006", "SW007", "SW014", "SW015"]
        );
    }

    #[test]
    fn should_report_marker_combinations() {
        let type_system = StaticTypeSystem::new(vec![interface("IRepo")]);
        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &type_system, &options);

        let declaration = TypeDeclaration::new(Some("App"), "Service")
            .with_attribute(
                AttributeData::new("DependsOn").with_type_arguments(vec![ty("IRepo"), ty("IRepo")]),
            )
            .with_attribute(AttributeData::new("ConditionalService").with_named_argument(
                "Environment",
                AttributeValue::Str("Production".to_string()),
            ))
            .with_attribute(
                AttributeData::new("SkipRegistration").with_type_arguments(vec![ty("App.IRepo")]),
            )
            .with_attribute(AttributeData::new("RegisterAs"))
            .with_field(inject("_repo", "IRepo"));

        assert_eq!(
            ids(&marker_combinations(&context, &declaration)),
            vec!["SW008", "SW009", "SW010", "SW017", "SW012", "SW016"]
        );
    }

    #[test]
    fn should_report_lifetime_violations() {
        let diagnostics = graph_diagnostics(vec![
            interface("IRepo"),
            interface("IClock"),
            service("Repo", "Scoped", &["App.IRepo"]),
            service("Clock", "Transient", &["App.IClock"]),
            service("Cache", "Singleton", &[])
                .with_field(inject("_repo", "App.IRepo"))
                .with_field(inject("_clock", "App.IClock")),
        ]);

        assert_eq!(diagnostics, vec!["SW004", "SW005"]);
    }

    #[test]
    fn should_report_missing_and_unregistered_implementations() {
        let diagnostics = graph_diagnostics(vec![
            interface("IRepo"),
            interface("IMailer"),
            TypeDeclaration {
                interfaces: vec![ty("App.IMailer")],
                ..TypeDeclaration::new(Some("App"), "Mailer")
            },
            service("Service", "Scoped", &[])
                .with_field(inject("_repo", "App.IRepo"))
                .with_field(inject("_mailer", "App.IMailer"))
                .with_field(inject("_logger", "ILogger<Service>")),
        ]);

        assert_eq!(diagnostics, vec!["SW001", "SW002"]);
    }

    #[test]
    fn should_report_cycles_once() {
        let diagnostics = graph_diagnostics(vec![
            service("A", "Scoped", &[]).with_field(inject("_b", "App.B")),
            service("B", "Scoped", &[]).with_field(inject("_c", "App.C")),
            service("C", "Scoped", &[]).with_field(inject("_a", "App.A")),
        ]);

        assert_eq!(diagnostics, vec!["SW003"]);
    }
}
