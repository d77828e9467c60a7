//! Conditional service registration support.
//!
//! A [Condition] guards registrations of a class with environment name and configuration value
//! comparisons. Environment names are compared case-insensitively, configuration values
//! ordinally.

use crate::model::quote_string;
use itertools::Itertools;

/// Runtime activation condition. Environment lists are kept sorted and deduplicated, so
/// structurally equal conditions are equal values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Condition {
    /// Any of these environments must be active.
    pub environments: Vec<String>,
    /// None of these environments may be active.
    pub not_environments: Vec<String>,
    /// Configuration key to compare.
    pub config_value: Option<String>,
    pub equals: Option<String>,
    pub not_equals: Option<String>,
}

fn contains_ignore_case(names: &[String], name: &str) -> bool {
    names.iter().any(|candidate| candidate.eq_ignore_ascii_case(name))
}

fn same_key(first: &Option<String>, second: &Option<String>) -> bool {
    match (first, second) {
        (Some(first), Some(second)) => first.eq_ignore_ascii_case(second),
        _ => false,
    }
}

impl Condition {
    pub fn uses_environment(&self) -> bool {
        !self.environments.is_empty() || !self.not_environments.is_empty()
    }

    pub fn uses_configuration(&self) -> bool {
        self.config_value.is_some()
    }

    /// Explains why the condition can never be satisfied or cannot be evaluated, if so.
    pub fn conflict(&self) -> Option<String> {
        if let Some(environment) = self
            .environments
            .iter()
            .find(|environment| contains_ignore_case(&self.not_environments, environment))
        {
            return Some(format!(
                "environment '{environment}' is both required and excluded"
            ));
        }

        if let (Some(equals), Some(not_equals)) = (&self.equals, &self.not_equals) {
            if equals == not_equals {
                return Some(format!("value '{equals}' is both required and excluded"));
            }
        }

        if self.config_value.is_none() && (self.equals.is_some() || self.not_equals.is_some()) {
            return Some("value comparison without ConfigValue".to_string());
        }

        if !self.uses_environment() && !self.uses_configuration() {
            return Some("no environment or configuration comparison".to_string());
        }

        None
    }

    /// Checks if both conditions can never hold at the same time.
    pub fn is_mutually_exclusive_with(&self, other: &Condition) -> bool {
        let disjoint_environments = !self.environments.is_empty()
            && !other.environments.is_empty()
            && !self
                .environments
                .iter()
                .any(|environment| contains_ignore_case(&other.environments, environment));

        let excluded_environments = |required: &Condition, excluding: &Condition| {
            !required.environments.is_empty()
                && required
                    .environments
                    .iter()
                    .all(|environment| contains_ignore_case(&excluding.not_environments, environment))
        };

        let disjoint_values = same_key(&self.config_value, &other.config_value)
            && match (&self.equals, &other.equals) {
                (Some(first), Some(second)) => first != second,
                _ => false,
            };

        let excluded_values = same_key(&self.config_value, &other.config_value)
            && ((self.equals.is_some() && self.equals == other.not_equals)
                || (other.equals.is_some() && other.equals == self.not_equals));

        disjoint_environments
            || excluded_environments(self, other)
            || excluded_environments(other, self)
            || disjoint_values
            || excluded_values
    }

    /// Renders the condition as a C# boolean expression over `environment` and `configuration`
    /// locals.
    pub fn render(&self) -> String {
        let mut parts = vec![];

        if !self.environments.is_empty() {
            let any = self
                .environments
                .iter()
                .map(|environment| {
                    format!(
                        "string.Equals(environment, {}, global::System.StringComparison.OrdinalIgnoreCase)",
                        quote_string(environment)
                    )
                })
                .join(" || ");

            parts.push(if self.environments.len() > 1 {
                format!("({any})")
            } else {
                any
            });
        }

        parts.extend(self.not_environments.iter().map(|environment| {
            format!(
                "!string.Equals(environment, {}, global::System.StringComparison.OrdinalIgnoreCase)",
                quote_string(environment)
            )
        }));

        if let Some(key) = &self.config_value {
            let value = format!("configuration[{}]", quote_string(key));
            match (&self.equals, &self.not_equals) {
                (None, None) => parts.push(format!("!string.IsNullOrEmpty({value})")),
                (equals, not_equals) => {
                    if let Some(equals) = equals {
                        parts.push(format!(
                            "string.Equals({value}, {}, global::System.StringComparison.Ordinal)",
                            quote_string(equals)
                        ));
                    }

                    if let Some(not_equals) = not_equals {
                        parts.push(format!(
                            "!string.Equals({value}, {}, global::System.StringComparison.Ordinal)",
                            quote_string(not_equals)
                        ));
                    }
                }
            }
        }

        if parts.is_empty() {
            "true".to_string()
        } else {
            parts.join(" && ")
        }
    }
}

/// Renders a guard satisfied by any of the given conditions.
pub fn render_any(conditions: &[Condition]) -> String {
    match conditions {
        [single] => single.render(),
        _ => conditions
            .iter()
            .map(|condition| format!("({})", condition.render()))
            .join(" || "),
    }
}

#[cfg(test)]
mod tests {
    use crate::registration::conditional::{render_any, Condition};

    fn environment(names: &[&str]) -> Condition {
        Condition {
            environments: names.iter().map(|name| name.to_string()).collect(),
            ..Default::default()
        }
    }

    fn config(key: &str, equals: Option<&str>, not_equals: Option<&str>) -> Condition {
        Condition {
            config_value: Some(key.to_string()),
            equals: equals.map(str::to_string),
            not_equals: not_equals.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn should_detect_mutually_exclusive_conditions() {
        assert!(environment(&["Production"]).is_mutually_exclusive_with(&environment(&["Development"])));
        assert!(!environment(&["Production", "Staging"])
            .is_mutually_exclusive_with(&environment(&["production"])));

        let not_production = Condition {
            not_environments: vec!["Production".to_string()],
            ..Default::default()
        };
        assert!(environment(&["Production"]).is_mutually_exclusive_with(&not_production));

        assert!(config("Cache:Kind", Some("Redis"), None)
            .is_mutually_exclusive_with(&config("cache:kind", Some("Memory"), None)));
        assert!(config("Cache:Kind", Some("Redis"), None)
            .is_mutually_exclusive_with(&config("Cache:Kind", None, Some("Redis"))));
        assert!(!config("Cache:Kind", Some("Redis"), None)
            .is_mutually_exclusive_with(&config("Other", Some("Memory"), None)));
        assert!(!environment(&["Production"])
            .is_mutually_exclusive_with(&config("Cache:Kind", Some("Redis"), None)));
    }

    #[test]
    fn should_detect_conflicts() {
        let condition = Condition {
            environments: vec!["Production".to_string()],
            not_environments: vec!["production".to_string()],
            ..Default::default()
        };
        assert!(condition.conflict().is_some());
        assert!(config("Key", Some("a"), Some("a")).conflict().is_some());
        assert!(Condition::default().conflict().is_some());
        assert!(environment(&["Production"]).conflict().is_none());
    }

    #[test]
    fn should_render_conditions() {
        assert_eq!(
            environment(&["Production"]).render(),
            "string.Equals(environment, \"Production\", global::System.StringComparison.OrdinalIgnoreCase)"
        );
        assert_eq!(
            config("Features:Cache", Some("true"), None).render(),
            "string.Equals(configuration[\"Features:Cache\"], \"true\", global::System.StringComparison.Ordinal)"
        );
        assert_eq!(
            render_any(&[config("A", None, None), config("B", None, None)]),
            "(!string.IsNullOrEmpty(configuration[\"A\"])) || (!string.IsNullOrEmpty(configuration[\"B\"]))"
        );
    }
}
