use thiserror::Error;

/// Errors related to parsing textual type references.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum TypeParseError {
    #[error("Cannot parse an empty type reference.")]
    Empty,
    #[error("Unexpected end of type reference: {0}")]
    UnexpectedEnd(String),
    #[error("Unexpected character '{character}' at position {position} in type reference: {text}")]
    UnexpectedCharacter {
        text: String,
        character: char,
        position: usize,
    },
}

/// Errors reported by a [DeclarationLocator](crate::type_system::DeclarationLocator) when the
/// syntax of a declaration cannot be scanned.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum LocatorError {
    #[error("Cannot resolve syntax for a partial fragment of type: {0}")]
    UnresolvedFragment(String),
    #[error("Unknown declaration: {0}")]
    UnknownDeclaration(String),
}

/// Errors related to reading marker attribute arguments.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum AttributeError {
    #[error("Argument '{argument}' of marker '{marker}' has an unexpected value: {value}")]
    UnexpectedValue {
        marker: String,
        argument: String,
        value: String,
    },
    #[error("Marker '{marker}' requires at least one type argument.")]
    MissingTypeArguments { marker: String },
}

/// Unexpected failures while assembling generated output for a single type. Such failures are
/// isolated to the type being processed and never abort a whole generation batch.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum SynthesisError {
    #[error("Cannot find a constructor parameter for base dependency {dependency} of {type_name}")]
    UnmatchedBaseDependency {
        type_name: String,
        dependency: String,
    },
    #[error("Error formatting generated source: {0}")]
    Format(#[from] std::fmt::Error),
}
