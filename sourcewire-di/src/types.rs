//! Structural handles for types appearing in analysed declarations.
//!
//! A [TypeRef] identifies a type the same way the host compiler would: by namespace, simple name
//! and generic arguments. Handles are plain values - two handles are the same type iff they are
//! structurally equal, which makes them usable as map keys during resolution.
//!
//! Handles can be parsed from and displayed as C# type syntax:
//!
//! ```
//! use sourcewire_di::types::TypeRef;
//!
//! let ty = TypeRef::parse("System.Collections.Generic.IEnumerable<MyApp.IService>").unwrap();
//! assert_eq!(ty.to_string(), "IEnumerable<IService>");
//! assert_eq!(
//!     ty.qualified().to_string(),
//!     "global::System.Collections.Generic.IEnumerable<global::MyApp.IService>"
//! );
//! ```

use crate::error::TypeParseError;
use fxhash::FxHashMap;
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const CONFIGURATION_NAMESPACE: &str = "Microsoft.Extensions.Configuration";
pub const OPTIONS_NAMESPACE: &str = "Microsoft.Extensions.Options";
pub const HOSTING_NAMESPACE: &str = "Microsoft.Extensions.Hosting";
pub const COLLECTIONS_NAMESPACE: &str = "System.Collections.Generic";
pub const SYSTEM_NAMESPACE: &str = "System";

const SCALAR_NAMES: &[&str] = &[
    "bool", "byte", "sbyte", "char", "decimal", "double", "float", "int", "uint", "long", "ulong",
    "short", "ushort", "string", "Boolean", "Byte", "SByte", "Char", "Decimal", "Double", "Single",
    "Int16", "Int32", "Int64", "UInt16", "UInt32", "UInt64", "String", "DateTime",
    "DateTimeOffset", "TimeSpan", "Guid", "Uri", "DateOnly", "TimeOnly", "Half",
];

const REFERENCE_SCALAR_NAMES: &[&str] = &["string", "String", "Uri"];

/// Collection shapes whose single generic argument is an element type.
const SEQUENCE_NAMES: &[&str] = &[
    "IEnumerable",
    "IList",
    "ICollection",
    "IReadOnlyList",
    "IReadOnlyCollection",
    "List",
    "ISet",
    "HashSet",
    "IReadOnlySet",
];

const DICTIONARY_NAMES: &[&str] = &["IDictionary", "IReadOnlyDictionary", "Dictionary"];

/// Type handle. See module documentation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum TypeRef {
    /// A named (possibly generic) type.
    Named(NamedType),
    /// A generic type parameter of the enclosing declaration.
    Parameter(String),
    /// Single-dimensional array of the element type.
    Array(Box<TypeRef>),
    /// Nullable wrapper - both `Nullable<T>` value types and nullable-annotated references.
    Nullable(Box<TypeRef>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedType {
    pub namespace: Option<String>,
    pub name: String,
    pub arguments: Vec<TypeRef>,
}

/// Well-known options-pattern wrappers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionsWrapper {
    Options,
    Snapshot,
    Monitor,
}

/// Builds the lookup key for a (possibly generic) type definition, e.g. ``MyApp.Repository`1``.
pub fn type_key(namespace: Option<&str>, name: &str, arity: usize) -> String {
    let mut key = match namespace {
        Some(namespace) if !namespace.is_empty() => format!("{namespace}.{name}"),
        _ => name.to_string(),
    };

    if arity > 0 {
        key.push('`');
        key.push_str(&arity.to_string());
    }

    key
}

impl TypeRef {
    /// Creates a non-generic named type.
    pub fn named(namespace: Option<&str>, name: &str) -> Self {
        Self::generic(namespace, name, vec![])
    }

    /// Creates a generic named type.
    pub fn generic(namespace: Option<&str>, name: &str, arguments: Vec<TypeRef>) -> Self {
        TypeRef::Named(NamedType {
            namespace: namespace
                .filter(|namespace| !namespace.is_empty())
                .map(str::to_string),
            name: name.to_string(),
            arguments,
        })
    }

    /// The configuration accessor type.
    pub fn configuration() -> Self {
        Self::named(Some(CONFIGURATION_NAMESPACE), "IConfiguration")
    }

    /// `IOptionsSnapshot<T>` for the given target.
    pub fn options_snapshot(target: TypeRef) -> Self {
        Self::generic(Some(OPTIONS_NAMESPACE), "IOptionsSnapshot", vec![target])
    }

    /// Parses C# type syntax. Generic parameters cannot be distinguished from named types by
    /// syntax alone - use [TypeRef::with_type_parameters] to mark them.
    pub fn parse(text: &str) -> Result<Self, TypeParseError> {
        let mut parser = TypeParser::new(text);
        parser.skip_whitespace();
        if parser.is_at_end() {
            return Err(TypeParseError::Empty);
        }

        let result = parser.parse_type()?;
        parser.skip_whitespace();
        parser.expect_end()?;
        Ok(result)
    }

    /// Replaces bare, non-generic, namespace-less names matching given parameter names with
    /// [TypeRef::Parameter].
    pub fn with_type_parameters(&self, parameters: &[String]) -> Self {
        if parameters.is_empty() {
            return self.clone();
        }

        match self {
            TypeRef::Named(named)
                if named.namespace.is_none()
                    && named.arguments.is_empty()
                    && parameters.contains(&named.name) =>
            {
                TypeRef::Parameter(named.name.clone())
            }
            TypeRef::Named(named) => TypeRef::Named(NamedType {
                namespace: named.namespace.clone(),
                name: named.name.clone(),
                arguments: named
                    .arguments
                    .iter()
                    .map(|argument| argument.with_type_parameters(parameters))
                    .collect(),
            }),
            TypeRef::Parameter(name) => TypeRef::Parameter(name.clone()),
            TypeRef::Array(element) => {
                TypeRef::Array(Box::new(element.with_type_parameters(parameters)))
            }
            TypeRef::Nullable(inner) => {
                TypeRef::Nullable(Box::new(inner.with_type_parameters(parameters)))
            }
        }
    }

    /// Substitutes generic parameters using given map. Unknown parameters are left untouched.
    pub fn substitute(&self, substitutions: &FxHashMap<String, TypeRef>) -> Self {
        if substitutions.is_empty() {
            return self.clone();
        }

        match self {
            TypeRef::Parameter(name) => substitutions
                .get(name)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeRef::Named(named) => TypeRef::Named(NamedType {
                namespace: named.namespace.clone(),
                name: named.name.clone(),
                arguments: named
                    .arguments
                    .iter()
                    .map(|argument| argument.substitute(substitutions))
                    .collect(),
            }),
            TypeRef::Array(element) => TypeRef::Array(Box::new(element.substitute(substitutions))),
            TypeRef::Nullable(inner) => {
                TypeRef::Nullable(Box::new(inner.substitute(substitutions)))
            }
        }
    }

    /// Simple name without namespace and generic arguments. Arrays and nullable wrappers report
    /// the name of the wrapped type.
    pub fn simple_name(&self) -> &str {
        match self {
            TypeRef::Named(named) => &named.name,
            TypeRef::Parameter(name) => name,
            TypeRef::Array(element) => element.simple_name(),
            TypeRef::Nullable(inner) => inner.simple_name(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            TypeRef::Named(named) => named.namespace.as_deref(),
            _ => None,
        }
    }

    pub fn arguments(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named(named) => &named.arguments,
            _ => &[],
        }
    }

    /// Lookup key of the type definition; see [type_key].
    pub fn key(&self) -> Option<String> {
        match self {
            TypeRef::Named(named) => Some(type_key(
                named.namespace.as_deref(),
                &named.name,
                named.arguments.len(),
            )),
            _ => None,
        }
    }

    /// Fully qualified name without generic arguments.
    pub fn full_name(&self) -> String {
        match self.namespace() {
            Some(namespace) => format!("{namespace}.{}", self.simple_name()),
            None => self.simple_name().to_string(),
        }
    }

    /// Checks for a named type with given name and arity. Types without a namespace match any
    /// expected namespace, since declarations are often written with simple names.
    pub fn is_named(&self, namespace: &str, name: &str, arity: usize) -> bool {
        match self {
            TypeRef::Named(named) => {
                named.name == name
                    && named.arguments.len() == arity
                    && named
                        .namespace
                        .as_deref()
                        .map(|own| own == namespace)
                        .unwrap_or(true)
            }
            _ => false,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }

    /// Removes a single level of nullable wrapping.
    pub fn unwrap_nullable(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner,
            _ => self,
        }
    }

    pub fn contains_type_parameters(&self) -> bool {
        match self {
            TypeRef::Parameter(_) => true,
            TypeRef::Named(named) => named
                .arguments
                .iter()
                .any(TypeRef::contains_type_parameters),
            TypeRef::Array(inner) | TypeRef::Nullable(inner) => inner.contains_type_parameters(),
        }
    }

    pub fn is_configuration_accessor(&self) -> bool {
        self.is_named(CONFIGURATION_NAMESPACE, "IConfiguration", 0)
    }

    pub fn options_wrapper(&self) -> Option<OptionsWrapper> {
        [
            ("IOptions", OptionsWrapper::Options),
            ("IOptionsSnapshot", OptionsWrapper::Snapshot),
            ("IOptionsMonitor", OptionsWrapper::Monitor),
        ]
        .into_iter()
        .find(|(name, _)| self.is_named(OPTIONS_NAMESPACE, name, 1))
        .map(|(_, wrapper)| wrapper)
    }

    /// Target type of an options-pattern wrapper.
    pub fn options_target(&self) -> Option<&TypeRef> {
        self.options_wrapper().and_then(|_| self.arguments().first())
    }

    /// Deferred construction wrappers: `Lazy<T>` and `Func<T>`.
    pub fn is_deferred_wrapper(&self) -> bool {
        self.is_named(SYSTEM_NAMESPACE, "Lazy", 1) || self.is_named(SYSTEM_NAMESPACE, "Func", 1)
    }

    /// Element type of sequence-shaped collections and arrays.
    pub fn collection_element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(element) => Some(element),
            TypeRef::Named(_)
                if SEQUENCE_NAMES
                    .iter()
                    .any(|name| self.is_named(COLLECTIONS_NAMESPACE, name, 1)) =>
            {
                self.arguments().first()
            }
            _ => None,
        }
    }

    pub fn is_dictionary(&self) -> bool {
        DICTIONARY_NAMES
            .iter()
            .any(|name| self.is_named(COLLECTIONS_NAMESPACE, name, 2))
    }

    pub fn is_collection(&self) -> bool {
        self.collection_element().is_some() || self.is_dictionary()
    }

    /// Primitive and well-known scalar types which can be read directly from a configuration
    /// value.
    pub fn is_scalar(&self) -> bool {
        match self {
            TypeRef::Named(named) if named.arguments.is_empty() => {
                SCALAR_NAMES.contains(&named.name.as_str())
                    && named
                        .namespace
                        .as_deref()
                        .map(|namespace| namespace == SYSTEM_NAMESPACE)
                        .unwrap_or(true)
            }
            _ => false,
        }
    }

    /// Scalars which are value types, i.e. need explicit nullable wrapping to express absence.
    pub fn is_value_scalar(&self) -> bool {
        self.is_scalar() && !REFERENCE_SCALAR_NAMES.contains(&self.simple_name())
    }

    /// Concrete collection type usable as a binding target for interface-typed collections.
    pub fn concrete_collection(&self) -> Option<TypeRef> {
        let arguments = self.arguments().to_vec();
        match self {
            TypeRef::Array(_) => Some(self.clone()),
            _ if ["ISet", "HashSet", "IReadOnlySet"]
                .iter()
                .any(|name| self.is_named(COLLECTIONS_NAMESPACE, name, 1)) =>
            {
                Some(Self::generic(
                    Some(COLLECTIONS_NAMESPACE),
                    "HashSet",
                    arguments,
                ))
            }
            _ if self.collection_element().is_some() => {
                Some(Self::generic(Some(COLLECTIONS_NAMESPACE), "List", arguments))
            }
            _ if self.is_dictionary() => Some(Self::generic(
                Some(COLLECTIONS_NAMESPACE),
                "Dictionary",
                arguments,
            )),
            _ => None,
        }
    }

    /// Collects namespaces of all types referenced by this handle.
    pub fn collect_namespaces(&self, namespaces: &mut BTreeSet<String>) {
        match self {
            TypeRef::Named(named) => {
                if let Some(namespace) = &named.namespace {
                    namespaces.insert(namespace.clone());
                }

                for argument in &named.arguments {
                    argument.collect_namespaces(namespaces);
                }
            }
            TypeRef::Parameter(_) => {}
            TypeRef::Array(inner) | TypeRef::Nullable(inner) => inner.collect_namespaces(namespaces),
        }
    }

    /// Displays the type with `global::`-qualified names.
    pub fn qualified(&self) -> QualifiedTypeRef<'_> {
        QualifiedTypeRef(self)
    }

    /// Displays the unbound generic form used in `typeof` expressions, e.g.
    /// `global::MyApp.Repository<>`.
    pub fn open_generic(&self) -> String {
        match self {
            TypeRef::Named(named) if !named.arguments.is_empty() => {
                let separators = ",".repeat(named.arguments.len() - 1);
                match &named.namespace {
                    Some(namespace) => format!("global::{namespace}.{}<{separators}>", named.name),
                    None => format!("{}<{separators}>", named.name),
                }
            }
            _ => self.qualified().to_string(),
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named(named) if named.arguments.is_empty() => write!(f, "{}", named.name),
            TypeRef::Named(named) => write!(
                f,
                "{}<{}>",
                named.name,
                named.arguments.iter().join(", ")
            ),
            TypeRef::Parameter(name) => write!(f, "{name}"),
            TypeRef::Array(element) => write!(f, "{element}[]"),
            TypeRef::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for TypeRef {
    type Error = TypeParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// See [TypeRef::qualified].
#[derive(Clone, Copy, Debug)]
pub struct QualifiedTypeRef<'a>(&'a TypeRef);

impl Display for QualifiedTypeRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            TypeRef::Named(named) => {
                if let Some(namespace) = &named.namespace {
                    write!(f, "global::{namespace}.")?;
                }

                write!(f, "{}", named.name)?;

                if !named.arguments.is_empty() {
                    write!(
                        f,
                        "<{}>",
                        named
                            .arguments
                            .iter()
                            .map(|argument| argument.qualified())
                            .join(", ")
                    )?;
                }

                Ok(())
            }
            TypeRef::Parameter(name) => write!(f, "{name}"),
            TypeRef::Array(element) => write!(f, "{}[]", element.qualified()),
            TypeRef::Nullable(inner) => write!(f, "{}?", inner.qualified()),
        }
    }
}

struct TypeParser<'a> {
    text: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> TypeParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            position: 0,
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map(char::is_whitespace).unwrap_or(false) {
            self.position += 1;
        }
    }

    fn unexpected(&self, character: char) -> TypeParseError {
        TypeParseError::UnexpectedCharacter {
            text: self.text.to_string(),
            character,
            position: self.position,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(character) if character == expected => {
                self.position += 1;
                Ok(())
            }
            Some(character) => Err(self.unexpected(character)),
            None => Err(TypeParseError::UnexpectedEnd(self.text.to_string())),
        }
    }

    fn expect_end(&self) -> Result<(), TypeParseError> {
        match self.peek() {
            Some(character) => Err(self.unexpected(character)),
            None => Ok(()),
        }
    }

    fn parse_identifier(&mut self) -> Result<String, TypeParseError> {
        self.skip_whitespace();
        let start = self.position;
        while self
            .peek()
            .map(|character| character.is_alphanumeric() || character == '_')
            .unwrap_or(false)
        {
            self.position += 1;
        }

        if start == self.position {
            return match self.peek() {
                Some(character) => Err(self.unexpected(character)),
                None => Err(TypeParseError::UnexpectedEnd(self.text.to_string())),
            };
        }

        Ok(self.chars[start..self.position].iter().collect())
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeParseError> {
        self.skip_whitespace();
        if self.text[self.byte_offset()..].starts_with("global::") {
            self.position += "global::".len();
        }

        let mut segments = vec![self.parse_identifier()?];
        while self.peek() == Some('.') {
            self.position += 1;
            segments.push(self.parse_identifier()?);
        }

        let name = segments.pop().unwrap_or_default();
        let namespace = segments.join(".");

        self.skip_whitespace();
        let mut arguments = vec![];
        if self.peek() == Some('<') {
            self.position += 1;
            arguments.push(self.parse_type()?);
            self.skip_whitespace();
            while self.peek() == Some(',') {
                self.position += 1;
                arguments.push(self.parse_type()?);
                self.skip_whitespace();
            }
            self.expect('>')?;
        }

        let mut result = TypeRef::generic(Some(&namespace), &name, arguments);

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('?') => {
                    self.position += 1;
                    result = TypeRef::Nullable(Box::new(result));
                }
                Some('[') => {
                    self.position += 1;
                    self.expect(']')?;
                    result = TypeRef::Array(Box::new(result));
                }
                _ => break,
            }
        }

        Ok(result)
    }

    fn byte_offset(&self) -> usize {
        self.chars[..self.position]
            .iter()
            .map(|character| character.len_utf8())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TypeParseError;
    use crate::types::{type_key, OptionsWrapper, TypeRef};
    use fxhash::FxHashMap;

    fn parse(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    #[test]
    fn should_parse_generic_types() {
        let ty = parse("Microsoft.Extensions.Logging.ILogger<MyApp.Foo>");
        assert_eq!(ty.namespace(), Some("Microsoft.Extensions.Logging"));
        assert_eq!(ty.simple_name(), "ILogger");
        assert_eq!(ty.arguments(), &[parse("MyApp.Foo")]);
        assert_eq!(ty.to_string(), "ILogger<Foo>");
    }

    #[test]
    fn should_parse_suffixes() {
        assert_eq!(
            parse("int?"),
            TypeRef::Nullable(Box::new(TypeRef::named(None, "int")))
        );
        assert_eq!(
            parse("string[]"),
            TypeRef::Array(Box::new(TypeRef::named(None, "string")))
        );
        assert_eq!(parse("global::System.String").full_name(), "System.String");
        assert_eq!(
            parse("Dictionary< string , List<int> >").to_string(),
            "Dictionary<string, List<int>>"
        );
    }

    #[test]
    fn should_reject_malformed_types() {
        assert_eq!(TypeRef::parse("  ").unwrap_err(), TypeParseError::Empty);
        assert!(matches!(
            TypeRef::parse("List<int").unwrap_err(),
            TypeParseError::UnexpectedEnd(_)
        ));
        assert!(matches!(
            TypeRef::parse("List<int>>").unwrap_err(),
            TypeParseError::UnexpectedCharacter { character: '>', .. }
        ));
    }

    #[test]
    fn should_substitute_type_parameters() {
        let ty = parse("IRepository<T, List<T>>").with_type_parameters(&["T".to_string()]);
        assert!(ty.contains_type_parameters());

        let substitutions: FxHashMap<_, _> = [("T".to_string(), parse("MyApp.User"))]
            .into_iter()
            .collect();
        assert_eq!(
            ty.substitute(&substitutions),
            parse("IRepository<MyApp.User, List<MyApp.User>>")
        );
    }

    #[test]
    fn should_recognize_well_known_shapes() {
        assert!(parse("IConfiguration").is_configuration_accessor());
        assert!(parse("Microsoft.Extensions.Configuration.IConfiguration").is_configuration_accessor());
        assert!(!parse("Other.IConfiguration").is_configuration_accessor());
        assert_eq!(
            parse("IOptionsSnapshot<Settings>").options_wrapper(),
            Some(OptionsWrapper::Snapshot)
        );
        assert!(parse("Lazy<IService>").is_deferred_wrapper());
        assert!(parse("Func<IService>").is_deferred_wrapper());
        assert_eq!(
            parse("IEnumerable<IService>").collection_element(),
            Some(&parse("IService"))
        );
        assert!(parse("IDictionary<string, int>").is_collection());
        assert!(parse("DateTime").is_value_scalar());
        assert!(parse("string").is_scalar());
        assert!(!parse("string").is_value_scalar());
        assert!(!parse("List<string>").is_scalar());
    }

    #[test]
    fn should_pick_concrete_collections() {
        assert_eq!(
            parse("IReadOnlyList<string>").concrete_collection(),
            Some(parse("System.Collections.Generic.List<string>"))
        );
        assert_eq!(
            parse("ISet<int>").concrete_collection(),
            Some(parse("System.Collections.Generic.HashSet<int>"))
        );
        assert_eq!(
            parse("IDictionary<string, int>").concrete_collection(),
            Some(parse("System.Collections.Generic.Dictionary<string, int>"))
        );
        assert_eq!(parse("Settings").concrete_collection(), None);
    }

    #[test]
    fn should_render_qualified_names() {
        assert_eq!(
            parse("MyApp.Repository<MyApp.User>").open_generic(),
            "global::MyApp.Repository<>"
        );
        assert_eq!(parse("MyApp.Map<K, V>").open_generic(), "global::MyApp.Map<,>");
        assert_eq!(
            parse("MyApp.IService?").qualified().to_string(),
            "global::MyApp.IService?"
        );
        assert_eq!(type_key(Some("MyApp"), "Repository", 1), "MyApp.Repository`1");
        assert_eq!(parse("MyApp.Repository<int>").key().unwrap(), "MyApp.Repository`1");
    }
}
