//! Sources of declarations to analyse.

use crate::application::{convert_error, ErrorPtr};
use config::{Config, File};
use derive_more::Constructor;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use sourcewire_di::model::TypeDeclaration;
use tracing::debug;

/// Provides declarations of the analysed program, e.g. dumped by a compiler plugin.
#[cfg_attr(test, automock)]
pub trait DeclarationSource {
    fn load(&self) -> Result<Vec<TypeDeclaration>, ErrorPtr>;
}

#[derive(Deserialize)]
struct DeclarationDump {
    #[serde(default)]
    declarations: Vec<TypeDeclaration>,
}

/// Reads declarations from a dump file in any format supported by the `config` crate. The file
/// contains a top-level `declarations` list, with one entry per declaration or partial fragment.
#[derive(Constructor, Clone, Debug)]
pub struct FileDeclarationSource {
    path: String,
}

impl DeclarationSource for FileDeclarationSource {
    fn load(&self) -> Result<Vec<TypeDeclaration>, ErrorPtr> {
        debug!(path = %self.path, "Reading declaration dump.");

        Config::builder()
            .add_source(File::with_name(&self.path))
            .build()
            .and_then(|config| config.try_deserialize::<DeclarationDump>())
            .map(|dump| dump.declarations)
            .map_err(convert_error)
    }
}
