//! Container registration synthesis.
//!
//! Every registrable class yields a [ClassRegistrations] entry describing which service types it
//! is registered as, with what lifetime and under which conditions. All entries of a generation
//! pass are then rendered into a single extension method registering them in a service
//! collection.

pub mod conditional;

use crate::configuration::ConfigurationBinding;
use crate::context::AnalysisContext;
use crate::emit::SourceWriter;
use crate::error::SynthesisError;
use crate::generator::{GeneratedSource, GeneratorOptions};
use crate::marker::{
    InstanceSharing, Lifetime, MarkerKind, RegisterAsAllAttributes, RegisterAsAttributes,
    RegistrationMode, SkipRegistrationAttributes,
};
use crate::model::{quote_string, TypeDeclaration};
use crate::registration::conditional::{render_any, Condition};
use crate::resolver::resolve_dependencies;
use crate::types::{TypeRef, CONFIGURATION_NAMESPACE};
use itertools::Itertools;
use std::collections::BTreeSet;

const DEPENDENCY_INJECTION_NAMESPACE: &str = "Microsoft.Extensions.DependencyInjection";

const SYSTEM_INTERFACE_NAMES: &[&str] = &[
    "IDisposable",
    "IAsyncDisposable",
    "ICloneable",
    "IComparable",
    "IEquatable",
    "IFormattable",
];

/// A single service type mapping.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceRegistration {
    pub class: TypeRef,
    /// Registered service type - equal to `class` for concrete type registrations.
    pub interface: TypeRef,
    pub lifetime: Lifetime,
    /// Resolve the concrete type registration instead of constructing a separate instance.
    pub use_shared_instance: bool,
    pub has_configuration_injection: bool,
}

impl ServiceRegistration {
    pub fn is_concrete(&self) -> bool {
        self.class == self.interface
    }

    pub fn is_open_generic(&self) -> bool {
        self.class.contains_type_parameters()
    }

    /// Renders the registration statement.
    pub fn render(&self) -> String {
        let method = format!("Add{}", self.lifetime.method_suffix());

        if self.lifetime == Lifetime::BackgroundService {
            format!("services.{method}<{}>();", self.class.qualified())
        } else if self.is_open_generic() {
            format!(
                "services.{method}(typeof({}), typeof({}));",
                self.interface.open_generic(),
                self.class.open_generic()
            )
        } else if self.is_concrete() {
            format!("services.{method}<{}>();", self.class.qualified())
        } else if self.use_shared_instance {
            format!(
                "services.{method}<{}>(provider => provider.GetRequiredService<{}>());",
                self.interface.qualified(),
                self.class.qualified()
            )
        } else {
            format!(
                "services.{method}<{}, {}>();",
                self.interface.qualified(),
                self.class.qualified()
            )
        }
    }
}

/// A registration guarded by a runtime condition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConditionalServiceRegistration {
    pub registration: ServiceRegistration,
    pub condition: Condition,
}

/// An options type bound to a configuration section.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionsBinding {
    pub options_type: TypeRef,
    pub section: String,
}

/// All registrations of a single class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassRegistrations {
    pub class: TypeRef,
    pub class_name: String,
    pub lifetime: Lifetime,
    pub registrations: Vec<ServiceRegistration>,
    /// Distinct activation conditions - empty for unconditional services.
    pub conditions: Vec<Condition>,
    pub options: Vec<OptionsBinding>,
    pub has_configuration_injection: bool,
}

impl ClassRegistrations {
    pub fn is_conditional(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn conditional_registrations(&self) -> Vec<ConditionalServiceRegistration> {
        self.conditions
            .iter()
            .flat_map(|condition| {
                self.registrations
                    .iter()
                    .map(|registration| ConditionalServiceRegistration {
                        registration: registration.clone(),
                        condition: condition.clone(),
                    })
            })
            .collect()
    }

    /// Service types this class can be resolved as.
    pub fn service_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.registrations
            .iter()
            .map(|registration| &registration.interface)
    }

    fn needs_configuration(&self) -> bool {
        self.has_configuration_injection
            || !self.options.is_empty()
            || self.conditions.iter().any(Condition::uses_configuration)
    }

    fn needs_environment(&self) -> bool {
        self.conditions.iter().any(Condition::uses_environment)
    }

    fn shares_service_type_with(&self, other: &ClassRegistrations) -> bool {
        self.registrations
            .iter()
            .filter(|registration| !registration.is_concrete())
            .any(|registration| {
                other
                    .service_types()
                    .any(|service_type| *service_type == registration.interface)
            })
    }
}

/// Checks if a class is ever registered in the container.
pub fn is_registrable(declaration: &TypeDeclaration) -> bool {
    declaration.is_class()
        && !declaration.is_abstract
        && !declaration.is_static
        && !declaration.has_marker(MarkerKind::UnregisteredService)
        && !declaration.has_marker(MarkerKind::ExternalService)
        && declaration.has_service_markers()
}

/// Lifetime from markers. Services without a lifetime marker are scoped.
pub fn class_lifetime(declaration: &TypeDeclaration) -> Lifetime {
    if declaration.has_marker(MarkerKind::BackgroundService) {
        return Lifetime::BackgroundService;
    }

    declaration
        .attributes
        .iter()
        .filter_map(|attribute| attribute.marker().and_then(MarkerKind::lifetime))
        .next()
        .unwrap_or_default()
}

pub fn is_system_interface(interface: &TypeRef) -> bool {
    match interface.namespace() {
        Some(namespace) => namespace == "System" || namespace.starts_with("System."),
        None => SYSTEM_INTERFACE_NAMES.contains(&interface.simple_name()),
    }
}

fn type_matches(first: &TypeRef, second: &TypeRef) -> bool {
    first == second
        || ((first.contains_type_parameters() || second.contains_type_parameters())
            && first.key() == second.key())
}

/// Checks if a class can be registered as given service type.
pub fn implements(context: &AnalysisContext, class: &TypeRef, service_type: &TypeRef) -> bool {
    type_matches(class, service_type)
        || context
            .type_system
            .interfaces(class)
            .iter()
            .any(|interface| type_matches(interface, service_type))
        || context.type_system.is_base_of(service_type, class)
}

/// Registration-relevant interfaces of a class.
pub fn registrable_interfaces(context: &AnalysisContext, class: &TypeRef) -> Vec<TypeRef> {
    context
        .type_system
        .interfaces(class)
        .into_iter()
        .filter(|interface| !is_system_interface(interface))
        .filter(|interface| !class.contains_type_parameters() || interface.contains_type_parameters())
        .collect()
}

/// Computes registrations of a single class, or `None` if the class is not registered at all.
/// Malformed markers are ignored here - they are reported during validation.
pub fn class_registrations(
    context: &AnalysisContext,
    declaration: &TypeDeclaration,
) -> Option<ClassRegistrations> {
    if !is_registrable(declaration) {
        return None;
    }

    let class = declaration.self_type();
    let lifetime = class_lifetime(declaration);
    let dependencies = resolve_dependencies(context, &class);
    let has_configuration_injection = !dependencies.configuration_fields.is_empty();

    let options = dependencies
        .configuration_fields
        .iter()
        .map(|field| &field.info)
        .filter(|info| {
            info.is_options_pattern()
                || (info.binding() == ConfigurationBinding::Section && info.supports_reloading)
        })
        .filter(|info| info.key_problem().is_none())
        .map(|info| OptionsBinding {
            options_type: info.bound_type().clone(),
            section: info.section_name(),
        })
        .unique()
        .collect();

    let register_as_all = declaration
        .markers(MarkerKind::RegisterAsAll)
        .find_map(|marker| RegisterAsAllAttributes::try_from(marker).ok());
    let register_as = declaration
        .markers(MarkerKind::RegisterAs)
        .filter_map(|marker| RegisterAsAttributes::try_from(marker).ok())
        .collect_vec();
    let skipped = declaration
        .markers(MarkerKind::SkipRegistration)
        .filter_map(|marker| SkipRegistrationAttributes::try_from(marker).ok())
        .flat_map(|attributes| attributes.types)
        .collect_vec();

    let explicitly_shared = register_as_all
        .map(|attributes| attributes.sharing == InstanceSharing::Shared)
        .unwrap_or(false)
        || register_as
            .iter()
            .any(|attributes| attributes.sharing == InstanceSharing::Shared);

    let use_shared_instance = !class.contains_type_parameters()
        && (explicitly_shared || lifetime == Lifetime::Singleton || has_configuration_injection);

    let service_types = if lifetime == Lifetime::BackgroundService {
        vec![class.clone()]
    } else if !register_as.is_empty() {
        let listed = register_as
            .iter()
            .flat_map(|attributes| attributes.types.iter())
            .filter(|service_type| implements(context, &class, service_type))
            .filter(|service_type| **service_type != class)
            .cloned()
            .unique();

        std::iter::once(class.clone()).chain(listed).collect()
    } else {
        let interfaces = registrable_interfaces(context, &class)
            .into_iter()
            .filter(|interface| !skipped.iter().any(|skip| type_matches(skip, interface)))
            .collect_vec();

        let mode = register_as_all
            .map(|attributes| attributes.mode)
            .unwrap_or_default();

        match mode {
            RegistrationMode::DirectOnly => vec![class.clone()],
            RegistrationMode::Exclusionary if interfaces.is_empty() => vec![class.clone()],
            RegistrationMode::Exclusionary if !use_shared_instance => interfaces,
            _ => std::iter::once(class.clone()).chain(interfaces).collect(),
        }
    };

    let registrations = service_types
        .into_iter()
        .map(|interface| ServiceRegistration {
            class: class.clone(),
            interface,
            lifetime,
            use_shared_instance,
            has_configuration_injection,
        })
        .collect();

    let conditions = declaration
        .markers(MarkerKind::ConditionalService)
        .filter_map(|marker| Condition::try_from(marker).ok())
        .unique()
        .collect();

    Some(ClassRegistrations {
        class,
        class_name: declaration.full_name(),
        lifetime,
        registrations,
        conditions,
        options,
        has_configuration_injection,
    })
}

/// Groups conditional classes which register the same service type.
fn conditional_groups(classes: &[&ClassRegistrations]) -> Vec<Vec<usize>> {
    let mut parents = (0..classes.len()).collect_vec();

    fn root(parents: &mut [usize], index: usize) -> usize {
        let mut current = index;
        while parents[current] != current {
            parents[current] = parents[parents[current]];
            current = parents[current];
        }
        current
    }

    for (first, second) in (0..classes.len()).tuple_combinations() {
        if classes[first].shares_service_type_with(classes[second])
            || classes[second].shares_service_type_with(classes[first])
        {
            let first_root = root(&mut parents, first);
            let second_root = root(&mut parents, second);
            parents[second_root] = first_root;
        }
    }

    (0..classes.len())
        .map(|index| (root(&mut parents, index), index))
        .into_group_map()
        .into_values()
        .sorted_by_key(|group| group.iter().min().copied())
        .collect()
}

fn is_exclusive_chain(classes: &[&ClassRegistrations]) -> bool {
    classes.len() > 1
        && classes.iter().tuple_combinations().all(|(first, second)| {
            first.conditions.iter().all(|first_condition| {
                second
                    .conditions
                    .iter()
                    .all(|second_condition| first_condition.is_mutually_exclusive_with(second_condition))
            })
        })
}

fn write_registrations(
    writer: &mut SourceWriter,
    class: &ClassRegistrations,
) -> Result<(), std::fmt::Error> {
    for registration in &class.registrations {
        writer.line(registration.render())?;
    }

    Ok(())
}

/// Sanitizes an assembly name for use in a method name.
pub fn registration_method_name(assembly_name: &str) -> String {
    let name: String = assembly_name
        .chars()
        .filter(|character| character.is_alphanumeric() || *character == '_')
        .collect();

    format!("Add{name}RegisteredServices")
}

/// Renders the registration extension method for all given classes.
pub fn render_registration_module(
    options: &GeneratorOptions,
    classes: &[ClassRegistrations],
) -> Result<GeneratedSource, SynthesisError> {
    let classes = classes
        .iter()
        .sorted_by(|first, second| first.class_name.cmp(&second.class_name))
        .collect_vec();

    let needs_configuration = classes.iter().any(|class| class.needs_configuration());
    let needs_environment = classes.iter().any(|class| class.needs_environment());

    let mut usings = BTreeSet::from([DEPENDENCY_INJECTION_NAMESPACE.to_string()]);
    if needs_configuration {
        usings.insert(CONFIGURATION_NAMESPACE.to_string());
    }

    let mut writer = SourceWriter::with_header(&usings)?;
    writer.line(format_args!(
        "namespace {}.Extensions.Generated;",
        options.root_namespace
    ))?;
    writer.blank();
    writer.open(format_args!(
        "public static class {}",
        options.extension_class_name
    ))?;

    let configuration_parameter = if needs_configuration {
        ", global::Microsoft.Extensions.Configuration.IConfiguration configuration"
    } else {
        ""
    };

    writer.open(format_args!(
        "public static global::Microsoft.Extensions.DependencyInjection.IServiceCollection {}(this global::Microsoft.Extensions.DependencyInjection.IServiceCollection services{configuration_parameter})",
        registration_method_name(&options.assembly_name)
    ))?;

    if needs_environment {
        let lookup = options
            .environment_variables
            .iter()
            .map(|variable| {
                format!(
                    "global::System.Environment.GetEnvironmentVariable({})",
                    quote_string(variable)
                )
            })
            .chain(std::iter::once("string.Empty".to_string()))
            .join(" ?? ");

        writer.line(format_args!("var environment = {lookup};"))?;
        writer.blank();
    }

    let bindings = classes
        .iter()
        .flat_map(|class| class.options.iter())
        .unique()
        .sorted()
        .collect_vec();

    for binding in &bindings {
        writer.line(format_args!(
            "services.Configure<{}>(configuration.GetSection({}));",
            binding.options_type.qualified(),
            quote_string(&binding.section)
        ))?;
    }

    if !bindings.is_empty() {
        writer.blank();
    }

    for class in classes.iter().filter(|class| !class.is_conditional()) {
        write_registrations(&mut writer, class)?;
    }

    let conditional = classes
        .iter()
        .copied()
        .filter(|class| class.is_conditional())
        .collect_vec();

    for group in conditional_groups(&conditional) {
        let group = group.into_iter().map(|index| conditional[index]).collect_vec();

        writer.blank();
        if is_exclusive_chain(&group) {
            for (index, class) in group.iter().enumerate() {
                let keyword = if index == 0 { "if" } else { "else if" };
                writer.open(format_args!("{keyword} ({})", render_any(&class.conditions)))?;
                write_registrations(&mut writer, class)?;
                writer.close()?;
            }
        } else {
            for class in group {
                writer.open(format_args!("if ({})", render_any(&class.conditions)))?;
                write_registrations(&mut writer, class)?;
                writer.close()?;
            }
        }
    }

    writer.blank();
    writer.line("return services;")?;
    writer.close()?;
    writer.close()?;

    Ok(GeneratedSource {
        hint_name: format!("{}.g.cs", options.extension_class_name),
        text: writer.finish(),
    })
}
