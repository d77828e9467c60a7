//! Configuration-bound fields and their binding strategies.

use crate::marker::ConfigurationAttributes;
use crate::model::{AttributeValue, FieldDeclaration};
use crate::types::TypeRef;

const SECTION_SUFFIXES: &[&str] = &["Settings", "Configuration", "Config", "Options"];

/// How a configuration-bound field receives its value. Each field type maps to exactly one
/// binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigurationBinding {
    /// Scalar read directly from a configuration value.
    DirectValue,
    /// Options wrapper resolved from the container.
    OptionsPattern,
    /// Object or collection bound from a configuration section.
    Section,
}

impl ConfigurationBinding {
    pub fn classify(field_type: &TypeRef) -> Self {
        let field_type = field_type.unwrap_nullable();
        if field_type.is_scalar() {
            ConfigurationBinding::DirectValue
        } else if field_type.options_wrapper().is_some() {
            ConfigurationBinding::OptionsPattern
        } else {
            ConfigurationBinding::Section
        }
    }
}

/// Problems with a configuration key which prevent code generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyProblem {
    Empty,
    LeadingSeparator,
    TrailingSeparator,
    EmptySegment,
    /// Direct values have no type name to infer a key from.
    MissingForDirectValue,
}

impl KeyProblem {
    pub fn describe(self) -> &'static str {
        match self {
            KeyProblem::Empty => "key is empty",
            KeyProblem::LeadingSeparator => "key starts with ':'",
            KeyProblem::TrailingSeparator => "key ends with ':'",
            KeyProblem::EmptySegment => "key contains '::'",
            KeyProblem::MissingForDirectValue => "direct value binding requires an explicit key",
        }
    }
}

pub fn validate_key(key: &str) -> Result<(), KeyProblem> {
    if key.trim().is_empty() {
        Err(KeyProblem::Empty)
    } else if key.starts_with(':') {
        Err(KeyProblem::LeadingSeparator)
    } else if key.ends_with(':') {
        Err(KeyProblem::TrailingSeparator)
    } else if key.contains("::") {
        Err(KeyProblem::EmptySegment)
    } else {
        Ok(())
    }
}

/// Infers a configuration section name from a type name by stripping a conventional suffix,
/// e.g. `DatabaseSettings` -> `Database`.
pub fn infer_section_name(ty: &TypeRef) -> String {
    let name = ty.unwrap_nullable().simple_name();
    SECTION_SUFFIXES
        .iter()
        .find_map(|suffix| {
            name.strip_suffix(suffix)
                .filter(|stripped| !stripped.is_empty())
        })
        .unwrap_or(name)
        .to_string()
}

/// A single configuration-bound field.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigurationInjectionInfo {
    pub field_name: String,
    pub field_type: TypeRef,
    /// `None` means the section name is inferred from the type name.
    pub configuration_key: Option<String>,
    pub default_value: Option<AttributeValue>,
    pub required: bool,
    pub supports_reloading: bool,
}

impl ConfigurationInjectionInfo {
    pub fn new(field: &FieldDeclaration, attributes: ConfigurationAttributes) -> Self {
        Self {
            field_name: field.name.clone(),
            field_type: field.field_type.clone(),
            configuration_key: attributes.key,
            default_value: attributes.default_value,
            required: attributes.required,
            supports_reloading: attributes.supports_reloading,
        }
    }

    pub fn binding(&self) -> ConfigurationBinding {
        ConfigurationBinding::classify(&self.field_type)
    }

    pub fn is_direct_value_binding(&self) -> bool {
        self.binding() == ConfigurationBinding::DirectValue
    }

    pub fn is_options_pattern(&self) -> bool {
        self.binding() == ConfigurationBinding::OptionsPattern
    }

    /// Type bound from configuration: the options target for options wrappers, the field type
    /// otherwise.
    pub fn bound_type(&self) -> &TypeRef {
        self.field_type
            .unwrap_nullable()
            .options_target()
            .unwrap_or_else(|| self.field_type.unwrap_nullable())
    }

    /// Configuration key or section name used for binding.
    pub fn section_name(&self) -> String {
        self.configuration_key
            .clone()
            .unwrap_or_else(|| infer_section_name(self.bound_type()))
    }

    pub fn key_problem(&self) -> Option<KeyProblem> {
        match &self.configuration_key {
            Some(key) => validate_key(key).err(),
            None if self.is_direct_value_binding() => Some(KeyProblem::MissingForDirectValue),
            None => None,
        }
    }

    /// Types which cannot be bound from configuration at all.
    pub fn is_supported_type(&self) -> bool {
        let ty = self.bound_type();
        !matches!(ty, TypeRef::Parameter(_))
            && !ty.is_deferred_wrapper()
            && !ty.is_configuration_accessor()
    }
}
