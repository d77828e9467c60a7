//! Batch entry point tying all passes together.

use crate::constructor::{synthesize_constructor, ConstructorSynthesis};
use crate::context::AnalysisContext;
use crate::diagnostics::Diagnostic;
use crate::error::SynthesisError;
use crate::model::TypeDeclaration;
use crate::naming::NamingOptions;
use crate::registration::{class_registrations, render_registration_module, ClassRegistrations};
use crate::type_system::{DeclarationLocator, TypeSystem};
use crate::validation::{dependency_graph, marker_combinations};
use fxhash::FxHashSet;
use tracing::{debug, warn};

pub const DEFAULT_EXTENSION_CLASS_NAME: &str = "GeneratedServiceCollectionExtensions";

/// Engine-level generation options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Name of the compiled assembly, used in the registration method name.
    pub assembly_name: String,
    /// Namespace under which the registration module is generated.
    pub root_namespace: String,
    pub extension_class_name: String,
    /// Environment variables consulted, in order, for the current environment name.
    pub environment_variables: Vec<String>,
    /// Default `DependsOn` field naming.
    pub naming: NamingOptions,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            assembly_name: "Application".to_string(),
            root_namespace: "Application".to_string(),
            extension_class_name: DEFAULT_EXTENSION_CLASS_NAME.to_string(),
            environment_variables: vec![
                "ASPNETCORE_ENVIRONMENT".to_string(),
                "DOTNET_ENVIRONMENT".to_string(),
            ],
            naming: NamingOptions::default(),
        }
    }
}

/// Single generated source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneratedSource {
    pub hint_name: String,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    pub sources: Vec<GeneratedSource>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationOutput {
    /// Looks up a generated source by its hint name.
    pub fn source(&self, hint_name: &str) -> Option<&GeneratedSource> {
        self.sources
            .iter()
            .find(|source| source.hint_name == hint_name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity() == crate::diagnostics::Severity::Error)
    }
}

/// Runs constructor synthesis, registration synthesis and validation over all declarations
/// known to the type system. Failures while synthesizing a class only drop the output for
/// that class.
pub struct Generator<'a> {
    context: AnalysisContext<'a>,
}

impl<'a> Generator<'a> {
    pub fn new(
        type_system: &'a dyn TypeSystem,
        locator: &'a dyn DeclarationLocator,
        options: &'a GeneratorOptions,
    ) -> Self {
        Self {
            context: AnalysisContext::new(type_system, locator, options),
        }
    }

    pub fn generate(&self) -> GenerationOutput {
        let mut output = GenerationOutput::default();
        let mut processed = FxHashSet::default();
        let mut registrations = vec![];

        for declaration in self.context.type_system.declarations() {
            if !declaration.is_class() || !processed.insert(declaration.key()) {
                continue;
            }

            if declaration.has_service_markers() {
                output
                    .diagnostics
                    .extend(marker_combinations(&self.context, declaration));

                match self.constructor_source(declaration) {
                    Ok((source, diagnostics)) => {
                        output.sources.extend(source);
                        output.diagnostics.extend(diagnostics);
                    }
                    Err(error) => {
                        warn!(
                            declaration = %declaration.full_name(),
                            %error,
                            "Cannot synthesize constructor."
                        );
                    }
                }
            }

            if let Some(registration) = class_registrations(&self.context, declaration) {
                registrations.push(registration);
            }
        }

        output
            .diagnostics
            .extend(dependency_graph(&self.context, &registrations));

        if let Some(source) = self.registration_source(&registrations) {
            output.sources.push(source);
        }

        debug!(
            sources = output.sources.len(),
            diagnostics = output.diagnostics.len(),
            "Generation finished."
        );

        output
    }

    fn constructor_source(
        &self,
        declaration: &TypeDeclaration,
    ) -> Result<(Option<GeneratedSource>, Vec<Diagnostic>), SynthesisError> {
        match synthesize_constructor(&self.context, declaration)? {
            ConstructorSynthesis::Generated(plan) => Ok((
                Some(GeneratedSource {
                    hint_name: plan.hint_name(),
                    text: plan.render()?,
                }),
                plan.diagnostics,
            )),
            ConstructorSynthesis::NotRequired => Ok((None, vec![])),
            ConstructorSynthesis::Ineligible(diagnostics) => Ok((None, diagnostics)),
        }
    }

    fn registration_source(&self, registrations: &[ClassRegistrations]) -> Option<GeneratedSource> {
        if registrations.is_empty() {
            return None;
        }

        render_registration_module(self.context.options, registrations)
            .map_err(|error| warn!(%error, "Cannot render registration module."))
            .ok()
    }
}
