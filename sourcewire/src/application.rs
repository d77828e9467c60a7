//! Core application functionality.

use crate::config::GeneratorConfigProvider;
use crate::sink::SourceSink;
use crate::source::DeclarationSource;
use derive_more::Constructor;
use sourcewire_di::diagnostics::{Diagnostic, Severity};
use sourcewire_di::generator::{Generator, GeneratorOptions};
use sourcewire_di::type_system::StaticTypeSystem;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Shared pointer to an error coming from an application collaborator.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

pub(crate) fn convert_error<E: Error + Send + Sync + 'static>(error: E) -> ErrorPtr {
    Arc::new(error) as ErrorPtr
}

#[derive(Clone, Error, Debug)]
pub enum ApplicationError {
    #[error("Error retrieving configuration: {0}")]
    ConfigError(ErrorPtr),
    #[error("Error loading declarations: {0}")]
    DeclarationSourceError(ErrorPtr),
    #[error("Error writing generated source {hint_name}: {error}")]
    SinkError { hint_name: String, error: ErrorPtr },
}

/// Summary of a single generation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Number of generated sources handed to the sink.
    pub fragment_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity() == Severity::Error)
    }
}

fn install_tracing_logger() {
    // another subscriber might have been installed by the host - keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Main entrypoint for the application. Loads declarations, runs the generator and passes
/// results to a [SourceSink].
#[derive(Constructor)]
pub struct Application<CP: GeneratorConfigProvider, DS: DeclarationSource, SS: SourceSink> {
    config_provider: CP,
    declaration_source: DS,
    sink: SS,
}

impl<CP: GeneratorConfigProvider, DS: DeclarationSource, SS: SourceSink> Application<CP, DS, SS> {
    pub fn run(&mut self) -> Result<GenerationReport, ApplicationError> {
        let config = self
            .config_provider
            .config()
            .map_err(ApplicationError::ConfigError)?;

        if config.install_tracing_logger {
            install_tracing_logger();
        }

        info!("Loading declarations...");

        let declarations = self
            .declaration_source
            .load()
            .map_err(ApplicationError::DeclarationSourceError)?;

        info!(count = declarations.len(), "Generating sources...");

        let options = GeneratorOptions::from(&config);
        let type_system = StaticTypeSystem::new(declarations);
        let output = Generator::new(&type_system, &type_system, &options).generate();

        for diagnostic in &output.diagnostics {
            match diagnostic.severity() {
                Severity::Error => error!(code = diagnostic.id(), "{diagnostic}"),
                Severity::Warning => warn!(code = diagnostic.id(), "{diagnostic}"),
            }
        }

        for source in &output.sources {
            self.sink
                .write(source)
                .map_err(|error| ApplicationError::SinkError {
                    hint_name: source.hint_name.clone(),
                    error,
                })?;
        }

        info!(
            fragments = output.sources.len(),
            diagnostics = output.diagnostics.len(),
            "Generation finished."
        );

        Ok(GenerationReport {
            fragment_count: output.sources.len(),
            diagnostics: output.diagnostics,
        })
    }
}
