//! Catalogue of diagnostics reported for analysed declarations. Problems in the analysed program
//! are never Rust errors - they are collected as [Diagnostic]s and never block generation of
//! unrelated types.

use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Static description of a diagnostic. Message formats use `{0}`, `{1}`... placeholders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DiagnosticDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub message_format: &'static str,
    pub severity: Severity,
    pub help: &'static str,
}

pub const MISSING_IMPLEMENTATION: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW001",
    title: "Missing implementation",
    message_format: "'{0}' depends on '{1}', but no implementation of '{1}' exists",
    severity: Severity::Warning,
    help: "Add a class implementing the dependency, or mark the dependency as external.",
};

pub const UNREGISTERED_IMPLEMENTATION: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW002",
    title: "Implementation not registered",
    message_format: "'{0}' depends on '{1}', but none of its implementations are registered",
    severity: Severity::Warning,
    help: "Add a lifetime marker to an implementation, or mark the dependency as external.",
};

pub const CIRCULAR_DEPENDENCY: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW003",
    title: "Circular dependency",
    message_format: "Circular dependency detected: {0}",
    severity: Severity::Warning,
    help: "Break the cycle with a deferred dependency (Lazy<T> or Func<T>) or restructure the services.",
};

pub const SINGLETON_DEPENDS_ON_SCOPED: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW004",
    title: "Singleton depends on scoped service",
    message_format: "Singleton '{0}' depends on scoped service '{1}'",
    severity: Severity::Error,
    help: "Make the dependency a singleton, or shorten the lifetime of the dependent service.",
};

pub const SINGLETON_DEPENDS_ON_TRANSIENT: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW005",
    title: "Singleton depends on transient service",
    message_format: "Singleton '{0}' depends on transient service '{1}', which will be captured for the lifetime of the process",
    severity: Severity::Warning,
    help: "Inject a factory (Func<T>) if a fresh instance is needed on every use.",
};

pub const NON_PARTIAL_CLASS: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW006",
    title: "Class must be partial",
    message_format: "'{0}' declares injected dependencies, but is not partial",
    severity: Severity::Error,
    help: "Add the 'partial' modifier so a constructor can be generated.",
};

pub const STATIC_INJECTED_FIELD: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW007",
    title: "Static field marked for injection",
    message_format: "Field '{1}' of '{0}' is static and cannot be injected",
    severity: Severity::Error,
    help: "Remove the 'static' modifier or the injection marker.",
};

pub const DUPLICATE_DEPENDS_ON: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW008",
    title: "Duplicate DependsOn type",
    message_format: "'{0}' declares DependsOn for '{1}' more than once",
    severity: Severity::Warning,
    help: "Remove the duplicate type argument.",
};

pub const DEPENDS_ON_ALREADY_INJECTED: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW009",
    title: "DependsOn type already injected",
    message_format: "'{0}' declares DependsOn for '{1}', which is already injected by field '{2}'",
    severity: Severity::Warning,
    help: "Remove either the DependsOn type argument or the injected field.",
};

pub const CONDITIONAL_WITHOUT_LIFETIME: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW010",
    title: "Conditional service without lifetime",
    message_format: "Conditional service '{0}' has no lifetime marker and is registered as scoped",
    severity: Severity::Warning,
    help: "Add a Scoped, Transient or Singleton marker.",
};

pub const CONFLICTING_CONDITIONS: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW011",
    title: "Conflicting conditional service conditions",
    message_format: "Condition of conditional service '{0}' can never be satisfied: {1}",
    severity: Severity::Error,
    help: "Remove the contradicting environment or configuration comparison.",
};

pub const SKIP_WITHOUT_REGISTER_AS_ALL: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW012",
    title: "SkipRegistration without RegisterAsAll",
    message_format: "'{0}' uses SkipRegistration without RegisterAsAll",
    severity: Severity::Warning,
    help: "Add RegisterAsAll, or remove SkipRegistration.",
};

pub const REGISTER_AS_NOT_IMPLEMENTED: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW013",
    title: "RegisterAs type not implemented",
    message_format: "'{0}' is registered as '{1}', which it does not implement",
    severity: Severity::Error,
    help: "Implement the interface or remove it from RegisterAs.",
};

pub const MALFORMED_CONFIGURATION_KEY: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW014",
    title: "Malformed configuration key",
    message_format: "Configuration key of field '{1}' in '{0}' is malformed: {2}",
    severity: Severity::Error,
    help: "Use a non-empty key with ':'-separated, non-empty segments.",
};

pub const UNSUPPORTED_CONFIGURATION_TYPE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW015",
    title: "Unsupported configuration binding type",
    message_format: "Field '{1}' in '{0}' has type '{2}', which cannot be bound from configuration",
    severity: Severity::Error,
    help: "Use a scalar, an options wrapper or a bindable class.",
};

pub const SKIP_NOT_IMPLEMENTED: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW016",
    title: "Skipped interface not implemented",
    message_format: "'{0}' skips registration of '{1}', which it does not implement",
    severity: Severity::Warning,
    help: "Remove the type from SkipRegistration.",
};

pub const MALFORMED_MARKER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW017",
    title: "Malformed marker arguments",
    message_format: "Marker on '{0}' is ignored: {1}",
    severity: Severity::Error,
    help: "Fix the marker arguments.",
};

pub const UNASSIGNED_INJECTED_FIELD: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SW018",
    title: "Injected field not assigned",
    message_format: "Field '{1}' of '{0}' is not assigned by the generated constructor, because '{2}' is already supplied through field '{3}'",
    severity: Severity::Warning,
    help: "Remove the duplicate field, or inject it under a distinct service type.",
};

/// A reported problem with substituted message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub descriptor: &'static DiagnosticDescriptor,
    /// Name of the declaration the problem was found in.
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(descriptor: &'static DiagnosticDescriptor, location: &str, arguments: &[&str]) -> Self {
        let message = arguments
            .iter()
            .enumerate()
            .fold(descriptor.message_format.to_string(), |message, (index, argument)| {
                message.replace(&format!("{{{index}}}"), argument)
            });

        Self {
            descriptor,
            location: location.to_string(),
            message,
        }
    }

    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }

    pub fn severity(&self) -> Severity {
        self.descriptor.severity
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} [{}]: {}. {}",
            self.severity(),
            self.id(),
            self.location,
            self.message,
            self.descriptor.help
        )
    }
}
