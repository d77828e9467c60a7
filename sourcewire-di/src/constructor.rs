//! Constructor synthesis for partial classes.
//!
//! A [ConstructorPlan] describes everything generated for a class: new dependency fields, the
//! parameter list (in resolver order, which base constructors rely on when forwarding), the
//! base constructor call and body statements assigning fields or binding configuration.

use crate::configuration::{ConfigurationBinding, ConfigurationInjectionInfo};
use crate::context::AnalysisContext;
use crate::diagnostics::{Diagnostic, Severity, UNASSIGNED_INJECTED_FIELD};
use crate::emit::SourceWriter;
use crate::error::SynthesisError;
use crate::marker::MarkerKind;
use crate::model::{AttributeValue, TypeDeclaration};
use crate::naming::ParameterNames;
use crate::resolver::{
    constructor_dependencies, resolve_dependencies, ConfigurationRole, Dependency,
    DependencySource,
};
use crate::types::{TypeRef, CONFIGURATION_NAMESPACE, HOSTING_NAMESPACE};
use crate::validation::declaration_shape;
use fxhash::FxHashSet;
use itertools::Itertools;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Private,
    Protected,
    Public,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneratedField {
    pub name: String,
    pub field_type: TypeRef,
    pub visibility: Visibility,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: String,
    pub dependency: Dependency,
}

/// Statement of the generated constructor body.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyStatement {
    /// `this.field = parameter;`
    Assign { field: String, parameter: String },
    /// `this.field = parameter.Value;`
    UnwrapOptions { field: String, parameter: String },
    /// Reads a scalar value from the configuration accessor.
    BindValue {
        accessor: String,
        info: ConfigurationInjectionInfo,
    },
    /// Binds an object or collection from a configuration section.
    BindSection {
        accessor: String,
        info: ConfigurationInjectionInfo,
    },
}

impl BodyStatement {
    pub fn render(&self) -> String {
        match self {
            BodyStatement::Assign { field, parameter } => format!("this.{field} = {parameter};"),
            BodyStatement::UnwrapOptions { field, parameter } => {
                format!("this.{field} = {parameter}.Value;")
            }
            BodyStatement::BindValue { accessor, info } => render_value_binding(accessor, info),
            BodyStatement::BindSection { accessor, info } => {
                render_section_binding(accessor, info)
            }
        }
    }
}

fn required_error(kind: &str, key: &str) -> String {
    format!(
        "throw new global::System.InvalidOperationException(\"Required configuration {kind} '{}' is missing.\")",
        key.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

const NUMERIC_NAMES: &[&str] = &[
    "byte", "sbyte", "decimal", "double", "float", "int", "uint", "long", "ulong", "short",
    "ushort", "Byte", "SByte", "Decimal", "Double", "Single", "Int16", "Int32", "Int64", "UInt16",
    "UInt32", "UInt64", "Half",
];

const CULTURE_PARSED_NAMES: &[&str] = &["DateTime", "DateTimeOffset", "TimeSpan", "DateOnly", "TimeOnly"];

fn is_string(ty: &TypeRef) -> bool {
    matches!(ty.simple_name(), "string" | "String")
}

fn parse_expression(text: &str, target: &TypeRef) -> String {
    let quoted = crate::model::quote_string(text);
    match target.simple_name() {
        "Uri" => format!("new {target}({quoted})"),
        name if NUMERIC_NAMES.contains(&name) || CULTURE_PARSED_NAMES.contains(&name) => format!(
            "{target}.Parse({quoted}, global::System.Globalization.CultureInfo.InvariantCulture)"
        ),
        _ => format!("{target}.Parse({quoted})"),
    }
}

/// Renders a configured default value as an expression of the bound scalar type. Defaults of
/// non-scalar bindings are rendered verbatim.
fn default_expression(default_value: &AttributeValue, target: &TypeRef) -> String {
    if !target.is_scalar() {
        return default_value.to_literal();
    }

    let folded = default_value.fold();
    let literal = folded.to_literal();
    match (folded, target.simple_name()) {
        (AttributeValue::Null, _) if target.is_value_scalar() => "default".to_string(),
        (AttributeValue::Str(text), _) if is_string(target) => crate::model::quote_string(&text),
        (AttributeValue::Str(text), _) => parse_expression(&text, target),
        (AttributeValue::Int(_) | AttributeValue::Float(_) | AttributeValue::Bool(_), _)
            if is_string(target) =>
        {
            crate::model::quote_string(&literal)
        }
        (AttributeValue::Float(_), "float" | "Single") => format!("{literal}f"),
        (AttributeValue::Float(_), "decimal" | "Decimal") => format!("{literal}m"),
        (AttributeValue::Float(_), "double" | "Double")
        | (
            AttributeValue::Int(_),
            "int" | "Int32" | "long" | "Int64" | "float" | "Single" | "double" | "Double"
            | "decimal" | "Decimal",
        )
        | (AttributeValue::Bool(_), "bool" | "Boolean") => literal,
        (AttributeValue::Int(_) | AttributeValue::Float(_), name) if NUMERIC_NAMES.contains(&name) => {
            format!("({target})({literal})")
        }
        (AttributeValue::Int(_) | AttributeValue::Float(_) | AttributeValue::Bool(_), _) => {
            parse_expression(&literal, target)
        }
        _ => literal,
    }
}

fn render_value_binding(accessor: &str, info: &ConfigurationInjectionInfo) -> String {
    let key = info.section_name();
    let value_type = info.field_type.unwrap_nullable();
    let read = format!(
        "{accessor}.GetValue<{value_type}?>({})",
        crate::model::quote_string(&key)
    );

    let fallback = match (&info.default_value, info.required, info.field_type.is_nullable()) {
        (Some(default_value), _, _) => Some(default_expression(default_value, value_type)),
        (None, true, false) => Some(required_error("value", &key)),
        (None, _, true) => None,
        (None, false, false) if value_type.is_value_scalar() => Some("default".to_string()),
        (None, false, false) => Some("default!".to_string()),
    };

    match fallback {
        Some(fallback) => format!("this.{} = {read} ?? {fallback};", info.field_name),
        None => format!("this.{} = {read};", info.field_name),
    }
}

fn render_section_binding(accessor: &str, info: &ConfigurationInjectionInfo) -> String {
    let section = info.section_name();
    let field_type = info.field_type.unwrap_nullable();
    let target = field_type
        .concrete_collection()
        .unwrap_or_else(|| field_type.clone());

    let read = format!(
        "{accessor}.GetSection({}).Get<{target}>()",
        crate::model::quote_string(&section)
    );

    let fallback = match (&info.default_value, info.required, info.field_type.is_nullable()) {
        (Some(default_value), _, _) => Some(default_expression(default_value, field_type)),
        (None, true, false) => Some(required_error("section", &section)),
        (None, _, true) => None,
        (None, false, false) => Some(match &target {
            TypeRef::Array(element) => format!("global::System.Array.Empty<{element}>()"),
            _ => format!("new {target}()"),
        }),
    };

    match fallback {
        Some(fallback) => format!("this.{} = {read} ?? {fallback};", info.field_name),
        None => format!("this.{} = {read};", info.field_name),
    }
}

/// Everything generated for a single class.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructorPlan {
    pub namespace: Option<String>,
    pub class_name: String,
    pub display_name: String,
    pub is_abstract: bool,
    pub fields: Vec<GeneratedField>,
    pub parameters: Vec<Parameter>,
    /// Arguments of the base constructor call, if one is made.
    pub base_arguments: Option<Vec<String>>,
    pub body: Vec<BodyStatement>,
    /// Warnings about the class found while planning.
    pub diagnostics: Vec<Diagnostic>,
}

impl ConstructorPlan {
    pub fn hint_name(&self) -> String {
        let full_name = match &self.namespace {
            Some(namespace) => format!("{namespace}.{}", self.display_name),
            None => self.display_name.clone(),
        };

        format!(
            "{}.Constructor.g.cs",
            full_name.replace(['<', '>'], "_").replace([',', ' '], "")
        )
    }

    fn usings(&self) -> BTreeSet<String> {
        let mut namespaces = BTreeSet::new();
        for field in &self.fields {
            field.field_type.collect_namespaces(&mut namespaces);
        }

        for parameter in &self.parameters {
            parameter
                .dependency
                .service_type
                .collect_namespaces(&mut namespaces);
        }

        let binds_configuration = self.body.iter().any(|statement| {
            matches!(
                statement,
                BodyStatement::BindValue { .. } | BodyStatement::BindSection { .. }
            )
        });

        if binds_configuration {
            namespaces.insert(CONFIGURATION_NAMESPACE.to_string());
            for statement in &self.body {
                if let BodyStatement::BindValue { info, .. } | BodyStatement::BindSection { info, .. } =
                    statement
                {
                    info.field_type.collect_namespaces(&mut namespaces);
                }
            }
        }

        if let Some(namespace) = &self.namespace {
            namespaces.remove(namespace);
        }

        namespaces
    }

    /// Renders the generated source file.
    pub fn render(&self) -> Result<String, SynthesisError> {
        let mut writer = SourceWriter::with_header(&self.usings())?;

        if let Some(namespace) = &self.namespace {
            writer.line(format_args!("namespace {namespace};"))?;
            writer.blank();
        }

        writer.open(format_args!("partial class {}", self.display_name))?;

        for field in &self.fields {
            writer.line(format_args!(
                "{} readonly {} {};",
                field.visibility.keyword(),
                field.field_type,
                field.name
            ))?;
        }

        if !self.fields.is_empty() {
            writer.blank();
        }

        let visibility = if self.is_abstract {
            Visibility::Protected
        } else {
            Visibility::Public
        };

        let parameters = self
            .parameters
            .iter()
            .map(|parameter| format!("{} {}", parameter.dependency.service_type, parameter.name))
            .join(", ");

        let base_call = self
            .base_arguments
            .as_ref()
            .map(|arguments| format!(" : base({})", arguments.join(", ")))
            .unwrap_or_default();

        writer.open(format_args!(
            "{} {}({parameters}){base_call}",
            visibility.keyword(),
            self.class_name
        ))?;

        for statement in &self.body {
            writer.line(statement.render())?;
        }

        writer.close()?;
        writer.close()?;

        Ok(writer.finish())
    }
}

/// Result of constructor synthesis for a class.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstructorSynthesis {
    Generated(ConstructorPlan),
    /// The class has no dependencies or already declares a matching constructor.
    NotRequired,
    /// The class cannot receive a generated constructor.
    Ineligible(Vec<Diagnostic>),
}

fn inherits_hosted_service(context: &AnalysisContext, ty: &TypeRef) -> bool {
    let mut visited = FxHashSet::default();
    let mut current = context.type_system.base_type(ty);

    while let Some(base) = current {
        if base.is_named(HOSTING_NAMESPACE, "BackgroundService", 0) {
            return true;
        }

        if !visited.insert(base.clone()) {
            return false;
        }

        current = context.type_system.base_type(&base);
    }

    false
}

/// Checks if a base class receives its own generated constructor, which derived classes must
/// call.
fn has_generated_constructor(context: &AnalysisContext, base: &TypeRef) -> bool {
    context
        .type_system
        .declaration(base)
        .map(|declaration| {
            declaration.is_partial
                && !declaration.has_marker(MarkerKind::ExternalService)
                && (declaration.has_service_markers() || inherits_hosted_service(context, base))
        })
        .unwrap_or(false)
}

/// Plans the constructor of a class.
pub fn synthesize_constructor(
    context: &AnalysisContext,
    declaration: &TypeDeclaration,
) -> Result<ConstructorSynthesis, SynthesisError> {
    if !declaration.is_class() || declaration.is_static {
        return Ok(ConstructorSynthesis::NotRequired);
    }

    let shape = declaration_shape(declaration);
    if shape
        .iter()
        .any(|diagnostic| diagnostic.severity() == Severity::Error)
    {
        return Ok(ConstructorSynthesis::Ineligible(shape));
    }

    if !declaration.is_partial {
        return Ok(ConstructorSynthesis::NotRequired);
    }

    let ty = declaration.self_type();
    let dependencies = resolve_dependencies(context, &ty);
    if dependencies.is_empty() {
        return Ok(ConstructorSynthesis::NotRequired);
    }

    let constructor_dependencies = constructor_dependencies(&dependencies.all_dependencies);
    let parameter_types = constructor_dependencies
        .iter()
        .map(|dependency| dependency.service_type.clone())
        .collect_vec();

    if declaration
        .constructors
        .iter()
        .any(|constructor| constructor.parameter_types == parameter_types)
    {
        debug!(declaration = %declaration.full_name(), "Matching constructor already exists.");
        return Ok(ConstructorSynthesis::NotRequired);
    }

    let mut names = ParameterNames::default();
    let parameters = constructor_dependencies
        .into_iter()
        .map(|dependency| Parameter {
            name: names.allocate(&dependency.field_name),
            dependency,
        })
        .collect_vec();

    let visibility = if declaration.is_abstract {
        Visibility::Protected
    } else {
        Visibility::Private
    };

    let own_keys: FxHashSet<_> = dependencies
        .derived_dependencies
        .iter()
        .map(|dependency| (&dependency.service_type, &dependency.field_name))
        .collect();

    let own_parameters = parameters
        .iter()
        .filter(|parameter| {
            own_keys.contains(&(
                &parameter.dependency.service_type,
                &parameter.dependency.field_name,
            ))
        })
        .collect_vec();

    let fields = own_parameters
        .iter()
        .filter(|parameter| parameter.dependency.source != DependencySource::ConfigurationInjection)
        .filter(|parameter| declaration.field(&parameter.dependency.field_name).is_none())
        .map(|parameter| GeneratedField {
            name: parameter.dependency.field_name.clone(),
            field_type: parameter.dependency.service_type.clone(),
            visibility,
        })
        .collect_vec();

    let base_arguments = context
        .type_system
        .base_type(&ty)
        .filter(|base| has_generated_constructor(context, base))
        .map(|base| base_constructor_arguments(context, declaration, &base, &parameters))
        .transpose()?
        .filter(|arguments| !arguments.is_empty());

    let mut body = vec![];
    for parameter in &own_parameters {
        let dependency = &parameter.dependency;
        let field = dependency.field_name.clone();
        let exists = declaration.field(&field).is_some()
            || fields.iter().any(|generated| generated.name == field);

        match dependency.configuration_role {
            Some(ConfigurationRole::ReloadableSnapshot) => body.push(BodyStatement::UnwrapOptions {
                field,
                parameter: parameter.name.clone(),
            }),
            Some(ConfigurationRole::Accessor) if !exists => {}
            _ if exists => body.push(BodyStatement::Assign {
                field,
                parameter: parameter.name.clone(),
            }),
            _ => {}
        }
    }

    let diagnostics =
        unassigned_inject_fields(declaration, &dependencies.derived_dependencies, &parameters);

    let accessor = parameters
        .iter()
        .find(|parameter| parameter.dependency.service_type.is_configuration_accessor())
        .map(|parameter| parameter.name.clone());

    if let Some(accessor) = accessor {
        for info in dependencies.own_configuration_fields() {
            match (info.binding(), info.supports_reloading) {
                (ConfigurationBinding::DirectValue, _) => body.push(BodyStatement::BindValue {
                    accessor: accessor.clone(),
                    info: info.clone(),
                }),
                (ConfigurationBinding::Section, false) => body.push(BodyStatement::BindSection {
                    accessor: accessor.clone(),
                    info: info.clone(),
                }),
                _ => {}
            }
        }
    }

    Ok(ConstructorSynthesis::Generated(ConstructorPlan {
        namespace: declaration.namespace.clone(),
        class_name: declaration.name.clone(),
        display_name: declaration.display_name(),
        is_abstract: declaration.is_abstract,
        fields,
        parameters,
        base_arguments,
        body,
        diagnostics,
    }))
}

/// Own `Inject` fields which lost their constructor parameter to a field of the same service
/// type declared at another level.
fn unassigned_inject_fields(
    declaration: &TypeDeclaration,
    own_dependencies: &[Dependency],
    parameters: &[Parameter],
) -> Vec<Diagnostic> {
    own_dependencies
        .iter()
        .filter(|dependency| dependency.source == DependencySource::Inject)
        .filter(|dependency| {
            !parameters.iter().any(|parameter| {
                parameter.dependency.service_type == dependency.service_type
                    && parameter.dependency.field_name == dependency.field_name
            })
        })
        .filter_map(|dependency| {
            parameters
                .iter()
                .find(|parameter| parameter.dependency.service_type == dependency.service_type)
                .map(|winner| {
                    Diagnostic::new(
                        &UNASSIGNED_INJECTED_FIELD,
                        &declaration.full_name(),
                        &[
                            declaration.display_name().as_str(),
                            dependency.field_name.as_str(),
                            dependency.service_type.to_string().as_str(),
                            winner.dependency.field_name.as_str(),
                        ],
                    )
                })
        })
        .collect()
}

/// Matches parameters of the base constructor, in the base's own order, to parameters of the
/// derived constructor.
fn base_constructor_arguments(
    context: &AnalysisContext,
    declaration: &TypeDeclaration,
    base: &TypeRef,
    parameters: &[Parameter],
) -> Result<Vec<String>, SynthesisError> {
    let base_dependencies =
        constructor_dependencies(&resolve_dependencies(context, base).all_dependencies);

    base_dependencies
        .iter()
        .map(|base_dependency| {
            parameters
                .iter()
                .find(|parameter| {
                    parameter.dependency.service_type == base_dependency.service_type
                        && parameter.dependency.field_name == base_dependency.field_name
                })
                .or_else(|| {
                    parameters.iter().find(|parameter| {
                        parameter.dependency.service_type == base_dependency.service_type
                    })
                })
                .map(|parameter| parameter.name.clone())
                .ok_or_else(|| SynthesisError::UnmatchedBaseDependency {
                    type_name: declaration.full_name(),
                    dependency: format!(
                        "{} {}",
                        base_dependency.service_type, base_dependency.field_name
                    ),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::configuration::ConfigurationInjectionInfo;
    use crate::constructor::{
        synthesize_constructor, BodyStatement, ConstructorSynthesis, Visibility,
    };
    use crate::context::AnalysisContext;
    use crate::generator::GeneratorOptions;
    use crate::model::{
        AttributeData, AttributeValue, ConstructorDeclaration, FieldDeclaration, TypeDeclaration,
    };
    use crate::type_system::{StaticTypeSystem, TypeSystem};
    use crate::types::TypeRef;

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    fn class(name: &str) -> TypeDeclaration {
        TypeDeclaration {
            is_partial: true,
            ..TypeDeclaration::new(Some("App"), name)
        }
    }

    fn inject(name: &str, field_type: &str) -> FieldDeclaration {
        FieldDeclaration::new(name, ty(field_type)).with_attribute(AttributeData::new("Inject"))
    }

    fn synthesize(declarations: Vec<TypeDeclaration>, target: &str) -> ConstructorSynthesis {
        let type_system = StaticTypeSystem::new(declarations);
        let options = GeneratorOptions::default();
        let context = AnalysisContext::new(&type_system, &type_system, &options);
        let declaration = type_system.declaration(&ty(target)).unwrap();
        synthesize_constructor(&context, declaration).unwrap()
    }

    fn info(field_type: &str, key: Option<&str>, required: bool) -> ConfigurationInjectionInfo {
        ConfigurationInjectionInfo {
            field_name: "_value".to_string(),
            field_type: ty(field_type),
            configuration_key: key.map(str::to_string),
            default_value: None,
            required,
            supports_reloading: false,
        }
    }

    #[test]
    fn should_generate_protected_fields_for_abstract_types() {
        let synthesis = synthesize(
            vec![TypeDeclaration {
                is_abstract: true,
                ..class("Handler")
            }
            .with_attribute(AttributeData::new("DependsOn").with_type_arguments(vec![ty("IBus")]))],
            "App.Handler",
        );

        let ConstructorSynthesis::Generated(plan) = synthesis else {
            panic!("Expected a generated constructor");
        };

        assert_eq!(plan.fields.len(), 1);
        assert_eq!(plan.fields[0].visibility, Visibility::Protected);
        assert_eq!(plan.fields[0].name, "_bus");
        assert!(plan
            .render()
            .unwrap()
            .contains("protected Handler(IBus bus)"));
    }

    #[test]
    fn should_skip_existing_constructor() {
        let synthesis = synthesize(
            vec![TypeDeclaration {
                constructors: vec![ConstructorDeclaration {
                    parameter_types: vec![ty("ICache")],
                }],
                ..class("Service")
            }
            .with_field(inject("_cache", "ICache"))],
            "App.Service",
        );

        assert_eq!(synthesis, ConstructorSynthesis::NotRequired);
    }

    #[test]
    fn should_report_ineligible_classes() {
        let synthesis = synthesize(
            vec![TypeDeclaration::new(Some("App"), "Service").with_field(inject("_cache", "ICache"))],
            "App.Service",
        );

        let ConstructorSynthesis::Ineligible(diagnostics) = synthesis else {
            panic!("Expected an ineligible class");
        };
        assert_eq!(diagnostics[0].id(), "SW006");
    }

    #[test]
    fn should_escape_and_disambiguate_parameter_names() {
        let synthesis = synthesize(
            vec![class("Service")
                .with_field(inject("_event", "IEventBus"))
                .with_field(inject("_cache", "ICache"))
                .with_field(inject("cache", "IBackupCache"))],
            "App.Service",
        );

        let ConstructorSynthesis::Generated(plan) = synthesis else {
            panic!("Expected a generated constructor");
        };

        let names: Vec<_> = plan.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["eventValue", "cache", "cache1"]);
        assert!(plan.fields.is_empty());
    }

    #[test]
    fn should_bind_configuration_in_body() {
        let synthesis = synthesize(
            vec![class("Service")
                .with_field(
                    FieldDeclaration::new("_timeout", ty("int")).with_attribute(
                        AttributeData::new("InjectConfiguration")
                            .with_argument(AttributeValue::Str("Http:Timeout".to_string()))
                            .with_named_argument("DefaultValue", AttributeValue::Int(30)),
                    ),
                )
                .with_field(
                    FieldDeclaration::new("_database", ty("DatabaseSettings")).with_attribute(
                        AttributeData::new("InjectConfiguration")
                            .with_named_argument("SupportsReloading", AttributeValue::Bool(true)),
                    ),
                )],
            "App.Service",
        );

        let ConstructorSynthesis::Generated(plan) = synthesis else {
            panic!("Expected a generated constructor");
        };

        let rendered = plan.render().unwrap();
        assert!(rendered.contains(
            "public Service(IOptionsSnapshot<DatabaseSettings> database, IConfiguration configuration)"
        ));
        assert!(rendered.contains("this._database = database.Value;"));
        assert!(rendered
            .contains("this._timeout = configuration.GetValue<int?>(\"Http:Timeout\") ?? 30;"));
        assert!(rendered.contains("using Microsoft.Extensions.Configuration;"));
        assert!(rendered.contains("using Microsoft.Extensions.Options;"));
    }

    #[test]
    fn should_render_value_bindings() {
        let statement = |info| BodyStatement::BindValue {
            accessor: "configuration".to_string(),
            info,
        };

        assert_eq!(
            statement(info("int", Some("Port"), true)).render(),
            "this._value = configuration.GetValue<int?>(\"Port\") ?? throw new global::System.InvalidOperationException(\"Required configuration value 'Port' is missing.\");"
        );
        assert_eq!(
            statement(info("int?", Some("Port"), true)).render(),
            "this._value = configuration.GetValue<int?>(\"Port\");"
        );
        assert_eq!(
            statement(info("int", Some("Port"), false)).render(),
            "this._value = configuration.GetValue<int?>(\"Port\") ?? default;"
        );
    }

    #[test]
    fn should_convert_defaults_to_bound_type() {
        let statement = |field_type: &str, default_value| BodyStatement::BindValue {
            accessor: "configuration".to_string(),
            info: ConfigurationInjectionInfo {
                default_value: Some(default_value),
                ..info(field_type, Some("Value"), true)
            },
        };

        assert_eq!(
            statement("float", AttributeValue::Float(1.5)).render(),
            "this._value = configuration.GetValue<float?>(\"Value\") ?? 1.5f;"
        );
        assert_eq!(
            statement("decimal", AttributeValue::Float(0.25)).render(),
            "this._value = configuration.GetValue<decimal?>(\"Value\") ?? 0.25m;"
        );
        assert_eq!(
            statement("double", AttributeValue::Int(3)).render(),
            "this._value = configuration.GetValue<double?>(\"Value\") ?? 3;"
        );
        assert_eq!(
            statement("short", AttributeValue::Int(-1)).render(),
            "this._value = configuration.GetValue<short?>(\"Value\") ?? (short)(-1);"
        );
        assert_eq!(
            statement("string", AttributeValue::Int(8080)).render(),
            "this._value = configuration.GetValue<string?>(\"Value\") ?? \"8080\";"
        );
        assert_eq!(
            statement("TimeSpan", AttributeValue::Str("00:00:30".to_string())).render(),
            "this._value = configuration.GetValue<TimeSpan?>(\"Value\") ?? TimeSpan.Parse(\"00:00:30\", global::System.Globalization.CultureInfo.InvariantCulture);"
        );
        assert_eq!(
            statement("bool", AttributeValue::Syntax("true".to_string())).render(),
            "this._value = configuration.GetValue<bool?>(\"Value\") ?? true;"
        );
        assert_eq!(
            statement("Guid", AttributeValue::Null).render(),
            "this._value = configuration.GetValue<Guid?>(\"Value\") ?? default;"
        );
    }

    #[test]
    fn should_render_section_bindings() {
        let statement = |info| BodyStatement::BindSection {
            accessor: "configuration".to_string(),
            info,
        };

        assert_eq!(
            statement(info("IReadOnlyList<string>", Some("Hosts"), false)).render(),
            "this._value = configuration.GetSection(\"Hosts\").Get<List<string>>() ?? new List<string>();"
        );
        assert_eq!(
            statement(info("string[]", Some("Hosts"), false)).render(),
            "this._value = configuration.GetSection(\"Hosts\").Get<string[]>() ?? global::System.Array.Empty<string>();"
        );
        assert_eq!(
            statement(info("SmtpSettings", None, true)).render(),
            "this._value = configuration.GetSection(\"Smtp\").Get<SmtpSettings>() ?? throw new global::System.InvalidOperationException(\"Required configuration section 'Smtp' is missing.\");"
        );
    }
}
