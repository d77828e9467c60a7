use sourcewire::application::{Application, ApplicationError};
use sourcewire::config::{DefaultGeneratorConfigProvider, GeneratorConfigProvider};
use sourcewire::sink::DirectorySourceSink;
use sourcewire::source::FileDeclarationSource;
use std::process::ExitCode;

fn main() -> Result<ExitCode, ApplicationError> {
    let config_provider = DefaultGeneratorConfigProvider::new();
    let config = config_provider
        .config()
        .map_err(ApplicationError::ConfigError)?;

    let source = FileDeclarationSource::new(config.declarations_file.clone());
    let sink = DirectorySourceSink::new(config.output_directory.clone().into());

    let report = Application::new(config_provider, source, sink).run()?;
    Ok(if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
