//! Declarations yielded by a declaration locator: types, their fields, constructors and the raw
//! attribute data attached to them. The model is purely descriptive - interpretation of
//! attributes happens in [marker](crate::marker).

use crate::marker::MarkerKind;
use crate::types::{type_key, TypeRef};
use itertools::Itertools;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
}

/// A single type declaration. Multiple partial fragments of the same type are merged into one
/// declaration by the [TypeSystem](crate::type_system::TypeSystem).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TypeDeclaration {
    pub namespace: Option<String>,
    pub name: String,
    pub type_parameters: Vec<String>,
    pub kind: TypeKind,
    pub is_partial: bool,
    pub is_abstract: bool,
    pub is_static: bool,
    pub base_type: Option<TypeRef>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<TypeRef>,
    pub attributes: Vec<AttributeData>,
    pub fields: Vec<FieldDeclaration>,
    pub constructors: Vec<ConstructorDeclaration>,
    /// Set when syntax of at least one partial fragment cannot be resolved, so only symbol-level
    /// information is reliable.
    pub has_unresolved_fragments: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: TypeRef,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConstructorDeclaration {
    pub parameter_types: Vec<TypeRef>,
}

/// Raw attribute as seen by the locator.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttributeData {
    pub name: String,
    pub type_arguments: Vec<TypeRef>,
    pub arguments: Vec<AttributeValue>,
    pub named_arguments: Vec<NamedArgument>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NamedArgument {
    pub name: String,
    pub value: AttributeValue,
}

/// Attribute argument value. Values are constant-folded by the host when possible, otherwise
/// the literal source text is provided as [AttributeValue::Syntax]. Dumps use snake case variant
/// tags, e.g. `{ "str": "Production" }`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Enum member, possibly qualified with the enum type name.
    Enum(String),
    Type(TypeRef),
    Array(Vec<AttributeValue>),
    /// Unfolded literal syntax.
    Syntax(String),
}

impl AttributeValue {
    /// Folds [AttributeValue::Syntax] into a constant if it's a recognizable literal.
    pub fn fold(&self) -> AttributeValue {
        match self {
            AttributeValue::Syntax(text) => fold_literal(text.trim()),
            _ => self.clone(),
        }
    }

    pub fn as_str(&self) -> Option<String> {
        match self.fold() {
            AttributeValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.fold() {
            AttributeValue::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the unqualified enum member name.
    pub fn as_enum_member(&self) -> Option<String> {
        match self.fold() {
            AttributeValue::Enum(value) => value.rsplit('.').next().map(str::to_string),
            AttributeValue::Int(value) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.fold(), AttributeValue::Null)
    }

    /// Renders the value as a C# literal expression.
    pub fn to_literal(&self) -> String {
        if let AttributeValue::Syntax(text) = self {
            return text.trim().to_string();
        }

        match self.clone() {
            AttributeValue::Null => "null".to_string(),
            AttributeValue::Bool(value) => value.to_string(),
            AttributeValue::Int(value) => value.to_string(),
            AttributeValue::Float(value) => value.to_string(),
            AttributeValue::Str(value) => quote_string(&value),
            AttributeValue::Enum(value) => value,
            AttributeValue::Type(ty) => format!("typeof({})", ty.qualified()),
            AttributeValue::Array(values) => {
                format!("new[] {{ {} }}", values.iter().map(|value| value.to_literal()).join(", "))
            }
            AttributeValue::Syntax(text) => text,
        }
    }

    /// Human-readable form for messages.
    pub fn describe(&self) -> String {
        match self.fold() {
            AttributeValue::Str(value) => value,
            other => other.to_literal(),
        }
    }
}

fn fold_literal(text: &str) -> AttributeValue {
    if text == "null" {
        return AttributeValue::Null;
    }

    if let Ok(value) = text.parse::<bool>() {
        return AttributeValue::Bool(value);
    }

    if let Some(value) = text
        .strip_prefix('"')
        .and_then(|text| text.strip_suffix('"'))
    {
        return AttributeValue::Str(unescape_string(value));
    }

    if let Ok(value) = text.parse::<i64>() {
        return AttributeValue::Int(value);
    }

    let numeric = text.trim_end_matches(['m', 'M', 'd', 'D', 'f', 'F']);
    if numeric.contains('.') {
        if let Ok(value) = numeric.parse::<f64>() {
            return AttributeValue::Float(value);
        }
    }

    if let Some(ty) = text
        .strip_prefix("typeof(")
        .and_then(|text| text.strip_suffix(')'))
        .and_then(|text| TypeRef::parse(text).ok())
    {
        return AttributeValue::Type(ty);
    }

    if text.contains('.')
        && text
            .split('.')
            .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_'))
    {
        return AttributeValue::Enum(text.to_string());
    }

    AttributeValue::Syntax(text.to_string())
}

fn unescape_string(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(character) = chars.next() {
        if character == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('0') => result.push('\0'),
                Some(other) => result.push(other),
                None => result.push('\\'),
            }
        } else {
            result.push(character);
        }
    }

    result
}

/// Quotes and escapes a string as a C# regular string literal.
pub fn quote_string(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for character in value.chars() {
        match character {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => result.push_str("\\0"),
            other => result.push(other),
        }
    }
    result.push('"');
    result
}

impl AttributeData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_type_arguments(mut self, type_arguments: Vec<TypeRef>) -> Self {
        self.type_arguments = type_arguments;
        self
    }

    pub fn with_argument(mut self, value: AttributeValue) -> Self {
        self.arguments.push(value);
        self
    }

    pub fn with_named_argument(mut self, name: &str, value: AttributeValue) -> Self {
        self.named_arguments.push(NamedArgument {
            name: name.to_string(),
            value,
        });
        self
    }

    /// Recognized marker kind, if any.
    pub fn marker(&self) -> Option<MarkerKind> {
        MarkerKind::classify(&self.name)
    }

    pub fn named(&self, name: &str) -> Option<&AttributeValue> {
        self.named_arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }

    pub fn positional(&self, index: usize) -> Option<&AttributeValue> {
        self.arguments.get(index)
    }

    /// Looks up a named argument first, falling back to a positional one.
    pub fn argument(&self, name: &str, index: usize) -> Option<&AttributeValue> {
        self.named(name).or_else(|| self.positional(index))
    }

    fn normalized(&self, parameters: &[String]) -> Self {
        Self {
            name: self.name.clone(),
            type_arguments: self
                .type_arguments
                .iter()
                .map(|ty| ty.with_type_parameters(parameters))
                .collect(),
            arguments: self.arguments.clone(),
            named_arguments: self.named_arguments.clone(),
        }
    }
}

impl FieldDeclaration {
    pub fn new(name: &str, field_type: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            is_static: false,
            is_const: false,
            attributes: vec![],
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeData) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.attributes
            .iter()
            .any(|attribute| attribute.marker() == Some(kind))
    }

    pub fn marker(&self, kind: MarkerKind) -> Option<&AttributeData> {
        self.attributes
            .iter()
            .find(|attribute| attribute.marker() == Some(kind))
    }

    pub fn is_instance(&self) -> bool {
        !self.is_static && !self.is_const
    }

    fn normalized(&self, parameters: &[String]) -> Self {
        Self {
            name: self.name.clone(),
            field_type: self.field_type.with_type_parameters(parameters),
            is_static: self.is_static,
            is_const: self.is_const,
            attributes: self
                .attributes
                .iter()
                .map(|attribute| attribute.normalized(parameters))
                .collect(),
        }
    }
}

impl TypeDeclaration {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Full name without generic arity.
    pub fn full_name(&self) -> String {
        type_key(self.namespace.as_deref(), &self.name, 0)
    }

    /// Lookup key, matching [TypeRef::key] of its instantiations.
    pub fn key(&self) -> String {
        type_key(
            self.namespace.as_deref(),
            &self.name,
            self.type_parameters.len(),
        )
    }

    /// The declared type with its own type parameters as arguments.
    pub fn self_type(&self) -> TypeRef {
        TypeRef::generic(
            self.namespace.as_deref(),
            &self.name,
            self.type_parameters
                .iter()
                .cloned()
                .map(TypeRef::Parameter)
                .collect(),
        )
    }

    /// Name with type parameter list, e.g. `Repository<T>`.
    pub fn display_name(&self) -> String {
        if self.type_parameters.is_empty() {
            self.name.clone()
        } else {
            format!("{}<{}>", self.name, self.type_parameters.join(", "))
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }

    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.attributes
            .iter()
            .any(|attribute| attribute.marker() == Some(kind))
    }

    pub fn markers(&self, kind: MarkerKind) -> impl Iterator<Item = &AttributeData> {
        self.attributes
            .iter()
            .filter(move |attribute| attribute.marker() == Some(kind))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks whether the declaration itself carries any injection-related field or class
    /// marker.
    pub fn has_injection_markers(&self) -> bool {
        self.has_marker(MarkerKind::DependsOn)
            || self.fields.iter().any(|field| {
                field.has_marker(MarkerKind::Inject) || field.has_marker(MarkerKind::InjectConfiguration)
            })
    }

    /// Checks whether the declaration carries any marker which makes it a service managed by the
    /// generator.
    pub fn has_service_markers(&self) -> bool {
        self.has_injection_markers()
            || self
                .attributes
                .iter()
                .filter_map(AttributeData::marker)
                .any(MarkerKind::is_service_marker)
    }

    pub fn with_attribute(mut self, attribute: AttributeData) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    /// Converts bare references to own type parameters into [TypeRef::Parameter]s. Declarations
    /// coming from textual sources cannot distinguish them otherwise.
    pub fn normalized(&self) -> Self {
        let parameters = &self.type_parameters;
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            type_parameters: parameters.clone(),
            kind: self.kind,
            is_partial: self.is_partial,
            is_abstract: self.is_abstract,
            is_static: self.is_static,
            base_type: self
                .base_type
                .as_ref()
                .map(|ty| ty.with_type_parameters(parameters)),
            interfaces: self
                .interfaces
                .iter()
                .map(|ty| ty.with_type_parameters(parameters))
                .collect(),
            attributes: self
                .attributes
                .iter()
                .map(|attribute| attribute.normalized(parameters))
                .collect(),
            fields: self
                .fields
                .iter()
                .map(|field| field.normalized(parameters))
                .collect(),
            constructors: self
                .constructors
                .iter()
                .map(|constructor| ConstructorDeclaration {
                    parameter_types: constructor
                        .parameter_types
                        .iter()
                        .map(|ty| ty.with_type_parameters(parameters))
                        .collect(),
                })
                .collect(),
            has_unresolved_fragments: self.has_unresolved_fragments,
        }
    }
}
