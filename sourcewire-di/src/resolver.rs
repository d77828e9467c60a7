//! Inheritance dependency resolution.
//!
//! Resolution walks the inheritance chain of a type level by level (0 is the type itself, 1 its
//! direct base and so on), collecting dependencies declared by each level. Collected
//! dependencies are then deduplicated across levels and declaration mechanisms, yielding the
//! ordered list a generated constructor accepts.
//!
//! Per-level rules:
//!
//! * an externally supplied type contributes its own dependencies only when it is the type being
//! resolved - its dependencies are assumed satisfied elsewhere when it's a base class
//! * options-pattern configuration fields are ordinary constructor dependencies
//! * reloadable scalar configuration fields need the configuration accessor
//! * reloadable section configuration fields need an options snapshot of their type
//! * other configuration fields are bound in the constructor body from the configuration
//! accessor, which is then added at level 0 if not already present
//!
//! Every call re-walks the whole chain - results are never cached.

use crate::configuration::{ConfigurationBinding, ConfigurationInjectionInfo};
use crate::context::AnalysisContext;
use crate::discovery::configuration::configuration_fields;
use crate::discovery::depends_on::depends_on_dependencies;
use crate::discovery::inject::inject_dependencies;
use crate::discovery::{scan_fields, DiscoveredDependency};
use crate::marker::MarkerKind;
use crate::types::TypeRef;
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use std::cmp::Reverse;
use tracing::debug;

/// Name of the configuration accessor dependency added for configuration binding.
pub const CONFIGURATION_FIELD_NAME: &str = "_configuration";

/// Mechanism which declared a dependency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencySource {
    Inject,
    DependsOn,
    ConfigurationInjection,
}

impl DependencySource {
    /// Preference when the same dependency is declared multiple times.
    fn deduplication_priority(self) -> u8 {
        match self {
            DependencySource::Inject => 0,
            DependencySource::DependsOn => 1,
            DependencySource::ConfigurationInjection => 2,
        }
    }

    /// Position within a single inheritance level of constructor parameters.
    fn ordering_priority(self) -> u8 {
        match self {
            DependencySource::DependsOn => 0,
            DependencySource::Inject => 1,
            DependencySource::ConfigurationInjection => 2,
        }
    }
}

/// Why a configuration field became a constructor dependency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigurationRole {
    /// Options wrapper field, assigned directly.
    OptionsField,
    /// Configuration accessor used for binding values in the constructor body.
    Accessor,
    /// Options snapshot whose value is unwrapped into a reloadable section field.
    ReloadableSnapshot,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub service_type: TypeRef,
    pub field_name: String,
    pub source: DependencySource,
    /// Distance from the resolved type in its inheritance chain.
    pub level: usize,
    pub is_external: bool,
    pub configuration_role: Option<ConfigurationRole>,
}

impl Dependency {
    fn discovered(dependency: DiscoveredDependency, source: DependencySource, level: usize) -> Self {
        Self {
            service_type: dependency.service_type,
            field_name: dependency.field_name,
            source,
            level,
            is_external: dependency.is_external,
            configuration_role: None,
        }
    }

    fn configuration(
        service_type: TypeRef,
        field_name: &str,
        level: usize,
        role: ConfigurationRole,
    ) -> Self {
        Self {
            service_type,
            field_name: field_name.to_string(),
            source: DependencySource::ConfigurationInjection,
            level,
            is_external: false,
            configuration_role: Some(role),
        }
    }

    fn key(&self) -> (&TypeRef, &str) {
        (&self.service_type, &self.field_name)
    }
}

/// A configuration field found at a given inheritance level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelConfiguration {
    pub level: usize,
    pub info: ConfigurationInjectionInfo,
}

/// Resolution result for a single type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InheritanceHierarchyDependencies {
    /// Deduplicated dependencies in constructor order: ancestors first.
    pub all_dependencies: Vec<Dependency>,
    /// Dependencies satisfied by base classes, not shadowed by derived ones.
    pub base_dependencies: Vec<Dependency>,
    /// Dependencies declared by the resolved type itself.
    pub derived_dependencies: Vec<Dependency>,
    /// Everything collected, before deduplication.
    pub raw_all_dependencies: Vec<Dependency>,
    pub configuration_fields: Vec<LevelConfiguration>,
}

impl InheritanceHierarchyDependencies {
    pub fn all_dependencies_with_external_flag(&self) -> Vec<(&TypeRef, bool)> {
        self.all_dependencies
            .iter()
            .map(|dependency| (&dependency.service_type, dependency.is_external))
            .collect()
    }

    /// Checks if the resolved type itself declares `Inject` fields. Deduplication can hide them,
    /// so raw dependencies are inspected.
    pub fn has_own_inject_fields(&self) -> bool {
        self.raw_all_dependencies.iter().any(|dependency| {
            dependency.level == 0 && dependency.source == DependencySource::Inject
        })
    }

    /// Configuration fields declared by the resolved type itself.
    pub fn own_configuration_fields(&self) -> impl Iterator<Item = &ConfigurationInjectionInfo> {
        self.configuration_fields
            .iter()
            .filter(|field| field.level == 0)
            .map(|field| &field.info)
    }

    pub fn is_empty(&self) -> bool {
        self.all_dependencies.is_empty() && self.configuration_fields.is_empty()
    }
}

/// Resolves dependencies of the given type across its inheritance chain.
pub fn resolve_dependencies(
    context: &AnalysisContext,
    ty: &TypeRef,
) -> InheritanceHierarchyDependencies {
    let type_system = context.type_system;

    let mut raw_all_dependencies = vec![];
    let mut configuration = vec![];
    let mut needs_accessor = false;
    let mut visited = FxHashSet::default();

    let mut current = Some(ty.clone());
    let mut level = 0;

    while let Some(current_type) = current {
        if !visited.insert(current_type.key()) {
            break;
        }

        let Some(declaration) = type_system.declaration(&current_type) else {
            break;
        };

        let includes_own = level == 0 || !declaration.has_marker(MarkerKind::ExternalService);
        if includes_own {
            let fields = scan_fields(context, declaration, &current_type);

            let mut level_dependencies = inject_dependencies(context, &fields)
                .into_iter()
                .map(|dependency| Dependency::discovered(dependency, DependencySource::Inject, level))
                .collect_vec();

            for info in configuration_fields(&fields) {
                match (info.binding(), info.supports_reloading) {
                    (ConfigurationBinding::OptionsPattern, _) => {
                        level_dependencies.push(Dependency::configuration(
                            info.field_type.clone(),
                            &info.field_name,
                            level,
                            ConfigurationRole::OptionsField,
                        ))
                    }
                    (ConfigurationBinding::DirectValue, true) => {
                        level_dependencies.push(Dependency::configuration(
                            TypeRef::configuration(),
                            CONFIGURATION_FIELD_NAME,
                            level,
                            ConfigurationRole::Accessor,
                        ))
                    }
                    (ConfigurationBinding::Section, true) => {
                        level_dependencies.push(Dependency::configuration(
                            TypeRef::options_snapshot(info.bound_type().clone()),
                            &info.field_name,
                            level,
                            ConfigurationRole::ReloadableSnapshot,
                        ))
                    }
                    _ => needs_accessor = true,
                }

                configuration.push(LevelConfiguration { level, info });
            }

            for dependency in depends_on_dependencies(context, declaration, &current_type) {
                let dependency =
                    Dependency::discovered(dependency, DependencySource::DependsOn, level);
                let dependency = with_unique_field_name(dependency, &level_dependencies);
                level_dependencies.push(dependency);
            }

            raw_all_dependencies.extend(level_dependencies);
        }

        current = type_system.base_type(&current_type);
        level += 1;
    }

    if !raw_all_dependencies
        .iter()
        .any(|dependency| dependency.source == DependencySource::Inject && dependency.level == 0)
    {
        let symbol_dependencies = inject_dependencies(context, &type_system.fields(ty));
        if !symbol_dependencies.is_empty() {
            debug!(%ty, "Recovering inject fields from symbols.");
            raw_all_dependencies.extend(symbol_dependencies.into_iter().map(|dependency| {
                Dependency::discovered(dependency, DependencySource::Inject, 0)
            }));
        }
    }

    if needs_accessor
        && !raw_all_dependencies
            .iter()
            .any(|dependency| dependency.service_type.is_configuration_accessor())
    {
        raw_all_dependencies.push(Dependency::configuration(
            TypeRef::configuration(),
            CONFIGURATION_FIELD_NAME,
            0,
            ConfigurationRole::Accessor,
        ));
    }

    let all_dependencies = deduplicate(&raw_all_dependencies);

    let own_keys: FxHashSet<_> = raw_all_dependencies
        .iter()
        .filter(|dependency| dependency.level == 0)
        .map(Dependency::key)
        .collect();

    let (derived_dependencies, inherited): (Vec<_>, Vec<_>) = all_dependencies
        .iter()
        .cloned()
        .partition(|dependency| own_keys.contains(&dependency.key()));

    let base_dependencies = inherited
        .into_iter()
        .filter(|dependency| {
            !derived_dependencies
                .iter()
                .any(|derived| derived.service_type == dependency.service_type)
        })
        .collect();

    debug!(
        %ty,
        dependencies = all_dependencies.len(),
        "Resolved inheritance hierarchy dependencies."
    );

    InheritanceHierarchyDependencies {
        all_dependencies,
        base_dependencies,
        derived_dependencies,
        raw_all_dependencies,
        configuration_fields: configuration,
    }
}

/// Generated field names are unique within a level: a name already taken by a dependency of
/// another type gets a numeric suffix. A name taken by the same type is kept, so repeated
/// declarations still deduplicate.
fn with_unique_field_name(mut dependency: Dependency, level: &[Dependency]) -> Dependency {
    let is_taken = |name: &str| {
        level.iter().any(|other| {
            other.field_name == name && other.service_type != dependency.service_type
        })
    };

    if !is_taken(&dependency.field_name) {
        return dependency;
    }

    let mut suffix = 2;
    let mut candidate = format!("{}{suffix}", dependency.field_name);
    while is_taken(&candidate) {
        suffix += 1;
        candidate = format!("{}{suffix}", dependency.field_name);
    }

    debug!(
        service_type = %dependency.service_type,
        field = %dependency.field_name,
        renamed = %candidate,
        "Renaming conflicting generated field."
    );

    dependency.field_name = candidate;
    dependency
}

/// Keeps a single dependency per (type, field name), preferring the declaration mechanism first
/// and the closest level second. The result is ordered ancestors first, then by mechanism.
fn deduplicate(raw: &[Dependency]) -> Vec<Dependency> {
    let mut positions: FxHashMap<(&TypeRef, &str), usize> = FxHashMap::default();
    let mut result: Vec<Dependency> = vec![];

    for dependency in raw {
        match positions.get(&dependency.key()) {
            Some(&position) => {
                let existing = &result[position];
                if (dependency.source.deduplication_priority(), dependency.level)
                    < (existing.source.deduplication_priority(), existing.level)
                {
                    result[position] = dependency.clone();
                }
            }
            None => {
                positions.insert(dependency.key(), result.len());
                result.push(dependency.clone());
            }
        }
    }

    result.sort_by_key(|dependency| {
        (
            Reverse(dependency.level),
            dependency.source.ordering_priority(),
        )
    });
    result
}

/// Applies single-type conflict rules for constructor parameters, without reordering:
///
/// * a type declared by both `Inject` and `DependsOn` keeps only the `Inject` declarations
/// * a type declared at multiple levels keeps only the most derived declaration, with ties
/// broken by mechanism and field name
pub fn constructor_dependencies(all_dependencies: &[Dependency]) -> Vec<Dependency> {
    let by_type = all_dependencies
        .iter()
        .into_group_map_by(|dependency| &dependency.service_type);

    let mut kept: FxHashSet<(&TypeRef, &str)> = FxHashSet::default();
    for group in by_type.values() {
        let has_inject = group
            .iter()
            .any(|dependency| dependency.source == DependencySource::Inject);
        let has_depends_on = group
            .iter()
            .any(|dependency| dependency.source == DependencySource::DependsOn);

        let candidates = group
            .iter()
            .filter(|dependency| {
                !(has_inject && has_depends_on && dependency.source == DependencySource::DependsOn)
            })
            .collect_vec();

        let level_count = candidates
            .iter()
            .map(|dependency| dependency.level)
            .unique()
            .count();

        if level_count > 1 {
            if let Some(winner) = candidates.iter().min_by(|a, b| {
                (a.level, a.source.deduplication_priority(), &a.field_name).cmp(&(
                    b.level,
                    b.source.deduplication_priority(),
                    &b.field_name,
                ))
            }) {
                kept.insert(winner.key());
            }
        } else {
            kept.extend(candidates.iter().map(|dependency| dependency.key()));
        }
    }

    all_dependencies
        .iter()
        .filter(|dependency| kept.contains(&dependency.key()))
        .cloned()
        .collect()
}
