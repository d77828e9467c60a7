//! Naming rules for synthesized fields and constructor parameters.

use crate::types::TypeRef;
use convert_case::{Case, Casing};
use fxhash::FxHashSet;
use serde::Deserialize;

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

const KEYWORD_SUFFIX: &str = "Value";

/// Case convention for fields generated from `DependsOn` markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    #[default]
    Camel,
    Pascal,
    Snake,
}

impl NamingConvention {
    fn case(self) -> Case {
        match self {
            NamingConvention::Camel => Case::Camel,
            NamingConvention::Pascal => Case::Pascal,
            NamingConvention::Snake => Case::Snake,
        }
    }
}

/// Field naming options for `DependsOn` dependencies.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamingOptions {
    pub convention: NamingConvention,
    /// Strip the leading `I` of interface names, e.g. `IRepository` -> `repository`.
    pub strip_i: bool,
    pub prefix: String,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            convention: NamingConvention::default(),
            strip_i: true,
            prefix: "_".to_string(),
        }
    }
}

/// Generates a field name for a `DependsOn` dependency type. Sequence-shaped types are named
/// after their pluralized element type:
///
/// ```
/// use sourcewire_di::naming::{depends_on_field_name, NamingOptions};
/// use sourcewire_di::types::TypeRef;
///
/// let options = NamingOptions::default();
/// let ty = TypeRef::parse("IEnumerable<ICategory>").unwrap();
/// assert_eq!(depends_on_field_name(&ty, &options), "_categories");
/// ```
pub fn depends_on_field_name(service_type: &TypeRef, options: &NamingOptions) -> String {
    let (name, is_plural) = match service_type.unwrap_nullable().collection_element() {
        Some(element) => (element.simple_name(), true),
        None => (service_type.simple_name(), false),
    };

    let name = if options.strip_i {
        strip_interface_prefix(name)
    } else {
        name
    };

    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[stem.len()..];

    // a digit-only name cannot be pluralized or cased sensibly
    let (stem, digits) = if stem.is_empty() {
        (name, "")
    } else {
        (stem, digits)
    };

    let (stem, digits) = if is_plural {
        (pluralize(stem), if digits == "1" { "" } else { digits })
    } else {
        (stem.to_string(), digits)
    };

    format!(
        "{}{}{}",
        options.prefix,
        stem.to_case(options.convention.case()),
        digits
    )
}

fn strip_interface_prefix(name: &str) -> &str {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(second)) if second.is_uppercase() => &name[1..],
        _ => name,
    }
}

/// English pluralization of the last word of a PascalCase name.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();

    for (singular, plural) in [("person", "people"), ("child", "children")] {
        if lower.ends_with(singular) {
            let stem = &word[..word.len() - singular.len()];
            let replaced = &word[word.len() - singular.len()..];
            let plural = if replaced.starts_with(char::is_uppercase) {
                let mut chars = plural.chars();
                chars
                    .next()
                    .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                    .unwrap_or_default()
            } else {
                plural.to_string()
            };

            return format!("{stem}{plural}");
        }
    }

    let mut reversed = lower.chars().rev();
    let last = reversed.next();
    let before_last = reversed.next();

    match (before_last, last) {
        // Analysis -> Analyses
        (Some('i'), Some('s')) => format!("{}es", &word[..word.len() - 2]),
        // singular forms ending in `s` get the `es` suffix below, anything else is already plural
        (Some(before), Some('s')) if !matches!(before, 's' | 'u' | 'a') => word.to_string(),
        (Some(before), Some('y')) if !is_vowel(before) => {
            format!("{}ies", &word[..word.len() - 1])
        }
        (_, Some('s' | 'x' | 'z')) | (Some('s' | 'c'), Some('h')) => format!("{word}es"),
        (_, Some('f')) => format!("{}ves", &word[..word.len() - 1]),
        (Some('f'), Some('e')) => format!("{}ves", &word[..word.len() - 2]),
        _ => format!("{word}s"),
    }
}

fn is_vowel(character: char) -> bool {
    matches!(character, 'a' | 'e' | 'i' | 'o' | 'u')
}

pub fn is_keyword(name: &str) -> bool {
    CSHARP_KEYWORDS.contains(&name)
}

/// Derives a constructor parameter name from a field name: leading underscores are stripped,
/// snake segments joined in camel case, the first letter is lowercased and keywords escaped.
pub fn parameter_name(field_name: &str) -> String {
    let segments: Vec<_> = field_name
        .split('_')
        .filter(|segment| !segment.is_empty())
        .collect();

    let mut name = String::with_capacity(field_name.len());
    for (index, segment) in segments.iter().enumerate() {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                name.extend(first.to_lowercase());
            } else {
                name.extend(first.to_uppercase());
            }
            name.extend(chars);
        }
    }

    if name.is_empty() {
        name.push_str("dependency");
    }

    if is_keyword(&name) {
        name.push_str(KEYWORD_SUFFIX);
    }

    name
}

/// Allocates unique parameter names within a single constructor.
#[derive(Clone, Debug, Default)]
pub struct ParameterNames {
    used: FxHashSet<String>,
}

impl ParameterNames {
    pub fn allocate(&mut self, field_name: &str) -> String {
        let base = parameter_name(field_name);
        let mut candidate = base.clone();
        let mut suffix = 1;

        while self.used.contains(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }

        self.used.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use crate::naming::{
        depends_on_field_name, parameter_name, pluralize, NamingConvention, NamingOptions,
        ParameterNames,
    };
    use crate::types::TypeRef;

    fn field_name(ty: &str) -> String {
        depends_on_field_name(&TypeRef::parse(ty).unwrap(), &NamingOptions::default())
    }

    #[test]
    fn should_pluralize_collection_element_names() {
        assert_eq!(field_name("IEnumerable<IService1>"), "_services");
        assert_eq!(field_name("IEnumerable<IService2>"), "_services2");
        assert_eq!(field_name("IList<ICategory>"), "_categories");
        assert_eq!(field_name("IReadOnlyCollection<IBus>"), "_buses");
        assert_eq!(field_name("IHandler[]"), "_handlers");
        assert_eq!(field_name("IEnumerable<IAlias>"), "_aliases");
        assert_eq!(field_name("IEnumerable<IAnalysis>"), "_analyses");
    }

    #[test]
    fn should_name_plain_dependencies() {
        assert_eq!(field_name("IUserRepository"), "_userRepository");
        assert_eq!(field_name("ILogger<Foo>"), "_logger");
        assert_eq!(field_name("IService1"), "_service1");
        assert_eq!(field_name("Icon"), "_icon");
    }

    #[test]
    fn should_apply_naming_options() {
        let options = NamingOptions {
            convention: NamingConvention::Snake,
            strip_i: false,
            prefix: "m_".to_string(),
        };

        assert_eq!(
            depends_on_field_name(&TypeRef::parse("IUserRepository").unwrap(), &options),
            "m_i_user_repository"
        );

        let options = NamingOptions {
            convention: NamingConvention::Pascal,
            strip_i: true,
            prefix: String::new(),
        };

        assert_eq!(
            depends_on_field_name(&TypeRef::parse("IUserRepository").unwrap(), &options),
            "UserRepository"
        );
    }

    #[test]
    fn should_pluralize_english_words() {
        assert_eq!(pluralize("Category"), "Categories");
        assert_eq!(pluralize("Key"), "Keys");
        assert_eq!(pluralize("Box"), "Boxes");
        assert_eq!(pluralize("Match"), "Matches");
        assert_eq!(pluralize("Wish"), "Wishes");
        assert_eq!(pluralize("Class"), "Classes");
        assert_eq!(pluralize("Leaf"), "Leaves");
        assert_eq!(pluralize("Knife"), "Knives");
        assert_eq!(pluralize("Settings"), "Settings");
        assert_eq!(pluralize("Categories"), "Categories");
        assert_eq!(pluralize("Rules"), "Rules");
        assert_eq!(pluralize("Alias"), "Aliases");
        assert_eq!(pluralize("Canvas"), "Canvases");
        assert_eq!(pluralize("Status"), "Statuses");
        assert_eq!(pluralize("Analysis"), "Analyses");
        assert_eq!(pluralize("Person"), "People");
        assert_eq!(pluralize("Handler"), "Handlers");
    }

    #[test]
    fn should_derive_parameter_names() {
        assert_eq!(parameter_name("_logger"), "logger");
        assert_eq!(parameter_name("_user_repository"), "userRepository");
        assert_eq!(parameter_name("Cache"), "cache");
        assert_eq!(parameter_name("_event"), "eventValue");
        assert_eq!(parameter_name("_"), "dependency");
    }

    #[test]
    fn should_allocate_unique_parameter_names() {
        let mut names = ParameterNames::default();
        assert_eq!(names.allocate("_logger"), "logger");
        assert_eq!(names.allocate("logger"), "logger1");
        assert_eq!(names.allocate("_logger"), "logger2");
    }
}
