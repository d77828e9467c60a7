//! Recognized marker attributes and their arguments.
//!
//! Attribute names are classified once into a closed set of [MarkerKind]s. Namespace
//! qualification, generic arity and the conventional `Attribute` suffix are ignored, so
//! `[Inject]`, `[InjectAttribute]` and `[global::IoC.Annotations.InjectAttribute]` are all the
//! same marker. Marker payloads are read with `TryFrom<&AttributeData>` conversions.
//!
//! ### Supported class markers
//!
//! * `Scoped`, `Transient`, `Singleton` - service lifetime
//! * `BackgroundService` - register as a hosted service
//! * `DependsOn<T...>` - synthesize dependency fields; `NamingConvention`, `StripI`, `Prefix` and
//! `External` arguments control generated field names and external classification
//! * `ExternalService` - instances are supplied outside the generated code
//! * `UnregisteredService` - participates in dependency graphs, but is never registered
//! * `RegisterAsAll(mode, sharing)` - multi-interface registration
//! * `RegisterAs<T...>` - register only for given interfaces
//! * `SkipRegistration<T...>` - exclude interfaces from registration
//! * `ConditionalService` - `Environment`, `NotEnvironment`, `ConfigValue`, `Equals`, `NotEquals`
//!
//! ### Supported field markers
//!
//! * `Inject` - constructor-injected dependency
//! * `InjectConfiguration(key)` - configuration-bound value; `DefaultValue`, `Required` and
//! `SupportsReloading` arguments
//! * `ExternalService` - the injected dependency is supplied externally

use crate::error::AttributeError;
use crate::model::{AttributeData, AttributeValue};
use crate::naming::{NamingConvention, NamingOptions};
use crate::registration::conditional::Condition;
use crate::types::TypeRef;
use itertools::Itertools;

/// Closed set of marker attributes understood by the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    Scoped,
    Transient,
    Singleton,
    BackgroundService,
    Inject,
    InjectConfiguration,
    DependsOn,
    ExternalService,
    UnregisteredService,
    RegisterAsAll,
    RegisterAs,
    SkipRegistration,
    ConditionalService,
}

impl MarkerKind {
    /// Classifies a raw attribute name.
    pub fn classify(attribute_name: &str) -> Option<Self> {
        let name = attribute_name.trim();
        let name = name.strip_prefix("global::").unwrap_or(name);
        let name = name.split(['<', '`']).next().unwrap_or(name);
        let name = name.rsplit('.').next().unwrap_or(name);
        let name = name.strip_suffix("Attribute").unwrap_or(name);

        match name {
            "Scoped" => Some(MarkerKind::Scoped),
            "Transient" => Some(MarkerKind::Transient),
            "Singleton" => Some(MarkerKind::Singleton),
            "BackgroundService" => Some(MarkerKind::BackgroundService),
            "Inject" => Some(MarkerKind::Inject),
            "InjectConfiguration" => Some(MarkerKind::InjectConfiguration),
            "DependsOn" => Some(MarkerKind::DependsOn),
            "ExternalService" => Some(MarkerKind::ExternalService),
            "UnregisteredService" => Some(MarkerKind::UnregisteredService),
            "RegisterAsAll" => Some(MarkerKind::RegisterAsAll),
            "RegisterAs" => Some(MarkerKind::RegisterAs),
            "SkipRegistration" => Some(MarkerKind::SkipRegistration),
            "ConditionalService" => Some(MarkerKind::ConditionalService),
            _ => None,
        }
    }

    /// Markers which make a class a service, apart from injection markers.
    pub fn is_service_marker(self) -> bool {
        !matches!(
            self,
            MarkerKind::Inject
                | MarkerKind::InjectConfiguration
                | MarkerKind::ExternalService
                | MarkerKind::SkipRegistration
        )
    }

    pub fn lifetime(self) -> Option<Lifetime> {
        match self {
            MarkerKind::Scoped => Some(Lifetime::Scoped),
            MarkerKind::Transient => Some(Lifetime::Transient),
            MarkerKind::Singleton => Some(Lifetime::Singleton),
            _ => None,
        }
    }
}

/// Service lifetime of a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Lifetime {
    #[default]
    Scoped,
    Transient,
    Singleton,
    /// Hosted service - a process-wide singleton started by the host.
    BackgroundService,
}

impl Lifetime {
    /// Whether instances live as long as the process.
    pub fn is_process_wide(self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::BackgroundService)
    }

    /// Registration method suffix, e.g. `Scoped` in `AddScoped`.
    pub fn method_suffix(self) -> &'static str {
        match self {
            Lifetime::Scoped => "Scoped",
            Lifetime::Transient => "Transient",
            Lifetime::Singleton => "Singleton",
            Lifetime::BackgroundService => "HostedService",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RegistrationMode {
    /// Register the concrete type only.
    DirectOnly,
    /// Register the concrete type and every implemented interface.
    #[default]
    All,
    /// Register interfaces only.
    Exclusionary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum InstanceSharing {
    /// Each registered service type gets its own instance.
    #[default]
    Separate,
    /// Interface registrations resolve the concrete type registration.
    Shared,
}

fn unexpected_value(marker: &AttributeData, argument: &str, value: &AttributeValue) -> AttributeError {
    AttributeError::UnexpectedValue {
        marker: marker.name.clone(),
        argument: argument.to_string(),
        value: value.describe(),
    }
}

fn read_bool(
    attribute: &AttributeData,
    name: &str,
    index: Option<usize>,
) -> Result<Option<bool>, AttributeError> {
    let value = match index {
        Some(index) => attribute.argument(name, index),
        None => attribute.named(name),
    };

    value
        .map(|value| {
            value
                .as_bool()
                .ok_or_else(|| unexpected_value(attribute, name, value))
        })
        .transpose()
}

fn read_string(
    attribute: &AttributeData,
    name: &str,
    index: Option<usize>,
) -> Result<Option<String>, AttributeError> {
    let value = match index {
        Some(index) => attribute.argument(name, index),
        None => attribute.named(name),
    };

    match value {
        None => Ok(None),
        Some(value) if value.is_null() => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| unexpected_value(attribute, name, value)),
    }
}

fn read_enum(
    attribute: &AttributeData,
    name: &str,
    index: usize,
) -> Result<Option<String>, AttributeError> {
    attribute
        .argument(name, index)
        .map(|value| {
            value
                .as_enum_member()
                .ok_or_else(|| unexpected_value(attribute, name, value))
        })
        .transpose()
}

fn require_type_arguments(attribute: &AttributeData) -> Result<Vec<TypeRef>, AttributeError> {
    if attribute.type_arguments.is_empty() {
        Err(AttributeError::MissingTypeArguments {
            marker: attribute.name.clone(),
        })
    } else {
        Ok(attribute.type_arguments.clone())
    }
}

/// Arguments of a `DependsOn<T...>` marker. Naming options not present on the marker are
/// `None` and should be taken from generator defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependsOnAttributes {
    pub types: Vec<TypeRef>,
    pub naming_convention: Option<NamingConvention>,
    pub strip_i: Option<bool>,
    pub prefix: Option<String>,
    pub external: bool,
}

impl DependsOnAttributes {
    /// Naming options with unspecified values taken from given defaults.
    pub fn naming(&self, defaults: &NamingOptions) -> NamingOptions {
        NamingOptions {
            convention: self.naming_convention.unwrap_or(defaults.convention),
            strip_i: self.strip_i.unwrap_or(defaults.strip_i),
            prefix: self
                .prefix
                .clone()
                .unwrap_or_else(|| defaults.prefix.clone()),
        }
    }
}

impl TryFrom<&AttributeData> for DependsOnAttributes {
    type Error = AttributeError;

    fn try_from(value: &AttributeData) -> Result<Self, Self::Error> {
        let naming_convention = read_enum(value, "NamingConvention", 0)?
            .map(|member| match member.as_str() {
                "CamelCase" | "Camel" | "0" => Ok(NamingConvention::Camel),
                "PascalCase" | "Pascal" | "1" => Ok(NamingConvention::Pascal),
                "SnakeCase" | "Snake" | "2" => Ok(NamingConvention::Snake),
                _ => Err(AttributeError::UnexpectedValue {
                    marker: value.name.clone(),
                    argument: "NamingConvention".to_string(),
                    value: member,
                }),
            })
            .transpose()?;

        Ok(Self {
            types: require_type_arguments(value)?,
            naming_convention,
            strip_i: read_bool(value, "StripI", Some(1))?,
            prefix: read_string(value, "Prefix", Some(2))?,
            external: read_bool(value, "External", Some(3))?.unwrap_or(false),
        })
    }
}

/// Arguments of an `InjectConfiguration` field marker.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigurationAttributes {
    pub key: Option<String>,
    pub default_value: Option<AttributeValue>,
    pub required: bool,
    pub supports_reloading: bool,
}

impl TryFrom<&AttributeData> for ConfigurationAttributes {
    type Error = AttributeError;

    fn try_from(value: &AttributeData) -> Result<Self, Self::Error> {
        Ok(Self {
            key: read_string(value, "ConfigurationKey", Some(0))?,
            default_value: value
                .named("DefaultValue")
                .filter(|default| !default.is_null())
                .cloned(),
            required: read_bool(value, "Required", None)?.unwrap_or(true),
            supports_reloading: read_bool(value, "SupportsReloading", None)?.unwrap_or(false),
        })
    }
}

/// Arguments of a `RegisterAsAll` marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RegisterAsAllAttributes {
    pub mode: RegistrationMode,
    pub sharing: InstanceSharing,
}

fn parse_sharing(attribute: &AttributeData, index: usize) -> Result<InstanceSharing, AttributeError> {
    read_enum(attribute, "InstanceSharing", index)?
        .map(|member| match member.as_str() {
            "Separate" | "0" => Ok(InstanceSharing::Separate),
            "Shared" | "1" => Ok(InstanceSharing::Shared),
            _ => Err(AttributeError::UnexpectedValue {
                marker: attribute.name.clone(),
                argument: "InstanceSharing".to_string(),
                value: member,
            }),
        })
        .transpose()
        .map(Option::unwrap_or_default)
}

impl TryFrom<&AttributeData> for RegisterAsAllAttributes {
    type Error = AttributeError;

    fn try_from(value: &AttributeData) -> Result<Self, Self::Error> {
        let mode = read_enum(value, "Mode", 0)?
            .map(|member| match member.as_str() {
                "DirectOnly" | "0" => Ok(RegistrationMode::DirectOnly),
                "All" | "1" => Ok(RegistrationMode::All),
                "Exclusionary" | "2" => Ok(RegistrationMode::Exclusionary),
                _ => Err(AttributeError::UnexpectedValue {
                    marker: value.name.clone(),
                    argument: "Mode".to_string(),
                    value: member,
                }),
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            mode,
            sharing: parse_sharing(value, 1)?,
        })
    }
}

/// Arguments of a `RegisterAs<T...>` marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterAsAttributes {
    pub types: Vec<TypeRef>,
    pub sharing: InstanceSharing,
}

impl TryFrom<&AttributeData> for RegisterAsAttributes {
    type Error = AttributeError;

    fn try_from(value: &AttributeData) -> Result<Self, Self::Error> {
        Ok(Self {
            types: require_type_arguments(value)?,
            sharing: parse_sharing(value, 0)?,
        })
    }
}

/// Arguments of a `SkipRegistration<T...>` marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkipRegistrationAttributes {
    pub types: Vec<TypeRef>,
}

impl TryFrom<&AttributeData> for SkipRegistrationAttributes {
    type Error = AttributeError;

    fn try_from(value: &AttributeData) -> Result<Self, Self::Error> {
        Ok(Self {
            types: require_type_arguments(value)?,
        })
    }
}

fn split_environments(value: Option<String>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .sorted_by_key(|name| name.to_lowercase())
                .dedup_by(|a, b| a.eq_ignore_ascii_case(b))
                .collect()
        })
        .unwrap_or_default()
}

impl TryFrom<&AttributeData> for Condition {
    type Error = AttributeError;

    fn try_from(value: &AttributeData) -> Result<Self, Self::Error> {
        Ok(Condition {
            environments: split_environments(read_string(value, "Environment", None)?),
            not_environments: split_environments(read_string(value, "NotEnvironment", None)?),
            config_value: read_string(value, "ConfigValue", None)?,
            equals: read_string(value, "Equals", None)?,
            not_equals: read_string(value, "NotEquals", None)?,
        })
    }
}
