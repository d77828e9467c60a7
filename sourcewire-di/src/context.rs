use crate::generator::GeneratorOptions;
use crate::type_system::{DeclarationLocator, TypeSystem};
use derivative::Derivative;

/// Shared, read-only collaborators of a single generation pass.
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug)]
pub struct AnalysisContext<'a> {
    #[derivative(Debug = "ignore")]
    pub type_system: &'a dyn TypeSystem,
    #[derivative(Debug = "ignore")]
    pub locator: &'a dyn DeclarationLocator,
    pub options: &'a GeneratorOptions,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        type_system: &'a dyn TypeSystem,
        locator: &'a dyn DeclarationLocator,
        options: &'a GeneratorOptions,
    ) -> Self {
        Self {
            type_system,
            locator,
            options,
        }
    }
}
