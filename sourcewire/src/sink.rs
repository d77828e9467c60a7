//! Destinations of generated sources.

use crate::application::{convert_error, ErrorPtr};
use derive_more::Constructor;
#[cfg(test)]
use mockall::automock;
use sourcewire_di::generator::GeneratedSource;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Receives generated sources.
#[cfg_attr(test, automock)]
pub trait SourceSink {
    fn write(&self, source: &GeneratedSource) -> Result<(), ErrorPtr>;
}

/// Writes each source into a file named after its hint name.
#[derive(Constructor, Clone, Debug)]
pub struct DirectorySourceSink {
    directory: PathBuf,
}

impl SourceSink for DirectorySourceSink {
    fn write(&self, source: &GeneratedSource) -> Result<(), ErrorPtr> {
        fs::create_dir_all(&self.directory).map_err(convert_error)?;

        let path = self.directory.join(&source.hint_name);
        debug!(path = %path.display(), "Writing generated source.");

        fs::write(path, &source.text).map_err(convert_error)
    }
}
