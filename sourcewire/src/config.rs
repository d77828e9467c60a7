//! Generator configuration is retrieved through a [GeneratorConfigProvider], which is later used
//! by the [Application](crate::application::Application) to configure both itself and the
//! generation engine.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `SOURCEWIRE_` or `sourcewire.json` file.

use crate::application::{convert_error, ErrorPtr};
use config::{Config, ConfigError, Environment, File};
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use sourcewire_di::generator::{GeneratorOptions, DEFAULT_EXTENSION_CLASS_NAME};
use sourcewire_di::naming::{NamingConvention, NamingOptions};

const CONFIG_ENV_PREFIX: &str = "SOURCEWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "sourcewire.json";

/// Application configuration which can be provided by a [GeneratorConfigProvider].
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
    /// Path of the declaration dump to analyse.
    pub declarations_file: String,
    /// Directory receiving generated sources.
    pub output_directory: String,
    pub assembly_name: String,
    /// Namespace of the generated registration module. Defaults to the assembly name.
    pub root_namespace: Option<String>,
    pub extension_class_name: String,
    pub environment_variables: Vec<String>,
    pub naming_convention: NamingConvention,
    pub strip_interface_prefix: bool,
    pub field_prefix: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let options = GeneratorOptions::default();
        Self {
            install_tracing_logger: true,
            declarations_file: "declarations.json".to_string(),
            output_directory: "generated".to_string(),
            assembly_name: options.assembly_name,
            root_namespace: None,
            extension_class_name: DEFAULT_EXTENSION_CLASS_NAME.to_string(),
            environment_variables: options.environment_variables,
            naming_convention: options.naming.convention,
            strip_interface_prefix: options.naming.strip_i,
            field_prefix: options.naming.prefix,
        }
    }
}

impl From<OptionalGeneratorConfig> for GeneratorConfig {
    fn from(value: OptionalGeneratorConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            declarations_file: value
                .declarations_file
                .unwrap_or(default.declarations_file),
            output_directory: value.output_directory.unwrap_or(default.output_directory),
            assembly_name: value.assembly_name.unwrap_or(default.assembly_name),
            root_namespace: value.root_namespace.or(default.root_namespace),
            extension_class_name: value
                .extension_class_name
                .unwrap_or(default.extension_class_name),
            environment_variables: value
                .environment_variables
                .unwrap_or(default.environment_variables),
            naming_convention: value
                .naming_convention
                .unwrap_or(default.naming_convention),
            strip_interface_prefix: value
                .strip_interface_prefix
                .unwrap_or(default.strip_interface_prefix),
            field_prefix: value.field_prefix.unwrap_or(default.field_prefix),
        }
    }
}

impl From<&GeneratorConfig> for GeneratorOptions {
    fn from(value: &GeneratorConfig) -> Self {
        Self {
            assembly_name: value.assembly_name.clone(),
            root_namespace: value
                .root_namespace
                .clone()
                .unwrap_or_else(|| value.assembly_name.clone()),
            extension_class_name: value.extension_class_name.clone(),
            environment_variables: value.environment_variables.clone(),
            naming: NamingOptions {
                convention: value.naming_convention,
                strip_i: value.strip_interface_prefix,
                prefix: value.field_prefix.clone(),
            },
        }
    }
}

impl GeneratorConfig {
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("environment_variables"),
            )
            .build()
            .and_then(|config| config.try_deserialize::<OptionalGeneratorConfig>())
            .map(|config| config.into())
    }
}

/// Provider for [GeneratorConfig].
#[cfg_attr(test, automock)]
pub trait GeneratorConfigProvider {
    fn config(&self) -> Result<GeneratorConfig, ErrorPtr>;
}

/// Provider loading the config from the environment once, on creation.
#[derive(Clone, Debug)]
pub struct DefaultGeneratorConfigProvider {
    // cached init result
    config: Result<GeneratorConfig, ErrorPtr>,
}

impl DefaultGeneratorConfigProvider {
    pub fn new() -> Self {
        Self {
            config: GeneratorConfig::init_from_environment().map_err(convert_error),
        }
    }
}

impl Default for DefaultGeneratorConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorConfigProvider for DefaultGeneratorConfigProvider {
    fn config(&self) -> Result<GeneratorConfig, ErrorPtr> {
        self.config.clone()
    }
}

#[derive(Deserialize)]
struct OptionalGeneratorConfig {
    install_tracing_logger: Option<bool>,
    declarations_file: Option<String>,
    output_directory: Option<String>,
    assembly_name: Option<String>,
    root_namespace: Option<String>,
    extension_class_name: Option<String>,
    environment_variables: Option<Vec<String>>,
    naming_convention: Option<NamingConvention>,
    strip_interface_prefix: Option<bool>,
    field_prefix: Option<String>,
}
