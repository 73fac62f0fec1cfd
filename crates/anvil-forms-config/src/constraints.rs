//! The constraint factory.
//!
//! Maps constraint declarations from form configuration to
//! [`ConstraintRule`] instances. A declaration is either a bare name
//! (`"not_blank"`) or a name with options (`{ length = { min = 2 } }`).
//! Unknown names fail at options-resolution time with the form name in the
//! error, before any submission is processed.

use once_cell::sync::Lazy;
use serde::Deserialize;

use anvil_forms_core::{FormsError, FormsResult, ValidationError};
use anvil_forms_storage::Value;

/// Options attached to a constraint declaration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConstraintOptions {
    /// Lower bound (length in characters, or numeric value for `range`).
    pub min: Option<f64>,
    /// Upper bound (length in characters, or numeric value for `range`).
    pub max: Option<f64>,
    /// Pattern for the `regex` constraint.
    pub pattern: Option<String>,
    /// Allowed values for the `choice` constraint.
    pub choices: Option<Vec<String>>,
    /// Custom error message overriding the built-in one.
    pub message: Option<String>,
}

/// A constructed validation rule.
///
/// Rules validate cleaned [`Value`]s. A rule that does not apply to the
/// value's type passes (a `length` rule ignores a boolean, matching how the
/// type-level cleaning already rejected mismatched input).
#[derive(Debug, Clone)]
pub enum ConstraintRule {
    /// The value must not be null, an empty string, or an empty list.
    NotBlank {
        /// Custom error message.
        message: Option<String>,
    },
    /// String values must look like an email address.
    Email {
        /// Custom error message.
        message: Option<String>,
    },
    /// String values must look like an http(s) URL.
    Url {
        /// Custom error message.
        message: Option<String>,
    },
    /// String length must fall within the given bounds.
    Length {
        /// Minimum length in characters.
        min: Option<usize>,
        /// Maximum length in characters.
        max: Option<usize>,
        /// Custom error message.
        message: Option<String>,
    },
    /// Numeric values must fall within the given bounds.
    Range {
        /// Minimum value.
        min: Option<f64>,
        /// Maximum value.
        max: Option<f64>,
        /// Custom error message.
        message: Option<String>,
    },
    /// String values must match the pattern.
    Regex {
        /// The compiled pattern.
        pattern: regex::Regex,
        /// Custom error message.
        message: Option<String>,
    },
    /// The value must be a member of the allowed set.
    Choice {
        /// Allowed values.
        allowed: Vec<String>,
        /// Custom error message.
        message: Option<String>,
    },
}

impl ConstraintRule {
    /// Validates a cleaned value against this rule.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match self {
            Self::NotBlank { message } => {
                let blank = match value {
                    Value::Null => true,
                    Value::String(s) => s.trim().is_empty(),
                    Value::List(items) => items.is_empty(),
                    _ => false,
                };
                if blank {
                    return Err(custom(message, "This value should not be blank.", "not_blank"));
                }
                Ok(())
            }

            Self::Email { message } => {
                if let Value::String(s) = value {
                    if !email_regex().is_match(s) {
                        return Err(custom(message, "Enter a valid email address.", "email"));
                    }
                }
                Ok(())
            }

            Self::Url { message } => {
                if let Value::String(s) = value {
                    if !url_regex().is_match(s) {
                        return Err(custom(message, "Enter a valid URL.", "url"));
                    }
                }
                Ok(())
            }

            Self::Length { min, max, message } => {
                if let Value::String(s) = value {
                    let len = s.chars().count();
                    if let Some(min) = min {
                        if len < *min {
                            return Err(custom(
                                message,
                                &format!(
                                    "Ensure this value has at least {min} characters (it has {len})."
                                ),
                                "length",
                            )
                            .with_param("min", min.to_string()));
                        }
                    }
                    if let Some(max) = max {
                        if len > *max {
                            return Err(custom(
                                message,
                                &format!(
                                    "Ensure this value has at most {max} characters (it has {len})."
                                ),
                                "length",
                            )
                            .with_param("max", max.to_string()));
                        }
                    }
                }
                Ok(())
            }

            Self::Range { min, max, message } => {
                let numeric = match value {
                    Value::Int(i) => Some(*i as f64),
                    Value::Float(f) => Some(*f),
                    _ => None,
                };
                if let Some(n) = numeric {
                    if let Some(min) = min {
                        if n < *min {
                            return Err(custom(
                                message,
                                &format!("Ensure this value is greater than or equal to {min}."),
                                "range",
                            ));
                        }
                    }
                    if let Some(max) = max {
                        if n > *max {
                            return Err(custom(
                                message,
                                &format!("Ensure this value is less than or equal to {max}."),
                                "range",
                            ));
                        }
                    }
                }
                Ok(())
            }

            Self::Regex { pattern, message } => {
                if let Value::String(s) = value {
                    if !pattern.is_match(s) {
                        return Err(custom(message, "Enter a valid value.", "regex"));
                    }
                }
                Ok(())
            }

            Self::Choice { allowed, message } => {
                let check = |s: &str| allowed.iter().any(|a| a == s);
                let valid = match value {
                    Value::String(s) => check(s),
                    Value::List(items) => items
                        .iter()
                        .all(|item| item.as_str().is_some_and(check)),
                    Value::Null => true,
                    _ => check(&value.to_string()),
                };
                if !valid {
                    return Err(custom(
                        message,
                        &format!("Select a valid choice. {value} is not one of the available choices."),
                        "choice",
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Constructs the rule for a constraint declaration.
///
/// Names are matched case-insensitively with underscores ignored, so the
/// configuration may use `not_blank` or `NotBlank` interchangeably.
///
/// # Errors
///
/// Returns [`FormsError::UnknownConstraint`] for an unrecognized name, and
/// a configuration error for an invalid `regex` pattern or a `choice`
/// constraint without allowed values.
pub fn constraint_rule(
    form_name: &str,
    name: &str,
    options: &ConstraintOptions,
) -> FormsResult<ConstraintRule> {
    let message = options.message.clone();
    match normalize(name).as_str() {
        "notblank" => Ok(ConstraintRule::NotBlank { message }),
        "email" => Ok(ConstraintRule::Email { message }),
        "url" => Ok(ConstraintRule::Url { message }),
        "length" => Ok(ConstraintRule::Length {
            min: options.min.map(|v| v as usize),
            max: options.max.map(|v| v as usize),
            message,
        }),
        "range" => Ok(ConstraintRule::Range {
            min: options.min,
            max: options.max,
            message,
        }),
        "regex" => {
            let raw = options.pattern.as_deref().ok_or_else(|| {
                FormsError::Configuration(format!(
                    "Constraint 'regex' on form '{form_name}' requires a pattern"
                ))
            })?;
            let pattern = regex::Regex::new(raw).map_err(|e| {
                FormsError::Configuration(format!(
                    "Invalid regex pattern on form '{form_name}': {e}"
                ))
            })?;
            Ok(ConstraintRule::Regex { pattern, message })
        }
        "choice" => {
            let allowed = options.choices.clone().ok_or_else(|| {
                FormsError::Configuration(format!(
                    "Constraint 'choice' on form '{form_name}' requires allowed choices"
                ))
            })?;
            Ok(ConstraintRule::Choice { allowed, message })
        }
        _ => Err(FormsError::UnknownConstraint {
            form: form_name.to_string(),
            name: name.to_string(),
        }),
    }
}

/// Lowercases a constraint name and strips underscores.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn custom(message: &Option<String>, default: &str, code: &str) -> ValidationError {
    ValidationError::new(
        message.clone().unwrap_or_else(|| default.to_string()),
        code,
    )
}

fn email_regex() -> &'static regex::Regex {
    static RE: Lazy<regex::Regex> = Lazy::new(|| {
        regex::Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
            .expect("valid regex")
    });
    &RE
}

fn url_regex() -> &'static regex::Regex {
    static RE: Lazy<regex::Regex> =
        Lazy::new(|| regex::Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid regex"));
    &RE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ConstraintOptions {
        ConstraintOptions::default()
    }

    #[test]
    fn test_factory_name_normalization() {
        assert!(constraint_rule("f", "not_blank", &opts()).is_ok());
        assert!(constraint_rule("f", "NotBlank", &opts()).is_ok());
        assert!(constraint_rule("f", "EMAIL", &opts()).is_ok());
    }

    #[test]
    fn test_factory_unknown_name() {
        let result = constraint_rule("contact", "sparkles", &opts());
        match result {
            Err(FormsError::UnknownConstraint { form, name }) => {
                assert_eq!(form, "contact");
                assert_eq!(name, "sparkles");
            }
            other => panic!("expected UnknownConstraint, got {other:?}"),
        }
    }

    #[test]
    fn test_not_blank() {
        let rule = constraint_rule("f", "not_blank", &opts()).unwrap();
        assert!(rule.validate(&Value::from("x")).is_ok());
        assert!(rule.validate(&Value::Null).is_err());
        assert!(rule.validate(&Value::from("   ")).is_err());
        assert!(rule.validate(&Value::List(vec![])).is_err());
        assert!(rule.validate(&Value::Bool(false)).is_ok());
    }

    #[test]
    fn test_email() {
        let rule = constraint_rule("f", "email", &opts()).unwrap();
        assert!(rule.validate(&Value::from("user@example.com")).is_ok());
        let err = rule.validate(&Value::from("not-an-email")).unwrap_err();
        assert_eq!(err.code, "email");
    }

    #[test]
    fn test_url() {
        let rule = constraint_rule("f", "url", &opts()).unwrap();
        assert!(rule.validate(&Value::from("https://example.com")).is_ok());
        assert!(rule.validate(&Value::from("example.com")).is_err());
    }

    #[test]
    fn test_length() {
        let rule = constraint_rule(
            "f",
            "length",
            &ConstraintOptions {
                min: Some(2.0),
                max: Some(5.0),
                ..opts()
            },
        )
        .unwrap();
        assert!(rule.validate(&Value::from("abc")).is_ok());

        let err = rule.validate(&Value::from("a")).unwrap_err();
        assert!(err.message.contains("at least 2"));
        assert_eq!(err.params.get("min").unwrap(), "2");

        let err = rule.validate(&Value::from("toolong")).unwrap_err();
        assert!(err.message.contains("at most 5"));
    }

    #[test]
    fn test_length_counts_characters() {
        let rule = constraint_rule(
            "f",
            "length",
            &ConstraintOptions {
                max: Some(3.0),
                ..opts()
            },
        )
        .unwrap();
        // Three characters, more than three bytes
        assert!(rule.validate(&Value::from("äöü")).is_ok());
    }

    #[test]
    fn test_range() {
        let rule = constraint_rule(
            "f",
            "range",
            &ConstraintOptions {
                min: Some(0.0),
                max: Some(10.0),
                ..opts()
            },
        )
        .unwrap();
        assert!(rule.validate(&Value::Int(5)).is_ok());
        assert!(rule.validate(&Value::Float(10.5)).is_err());
        assert!(rule.validate(&Value::Int(-1)).is_err());
        // Non-numeric values are out of scope for range
        assert!(rule.validate(&Value::from("five")).is_ok());
    }

    #[test]
    fn test_regex() {
        let rule = constraint_rule(
            "f",
            "regex",
            &ConstraintOptions {
                pattern: Some(r"^[A-Z]{3}\d{3}$".to_string()),
                ..opts()
            },
        )
        .unwrap();
        assert!(rule.validate(&Value::from("ABC123")).is_ok());
        assert!(rule.validate(&Value::from("abc")).is_err());
    }

    #[test]
    fn test_regex_requires_pattern() {
        assert!(matches!(
            constraint_rule("f", "regex", &opts()),
            Err(FormsError::Configuration(_))
        ));
    }

    #[test]
    fn test_regex_invalid_pattern() {
        let result = constraint_rule(
            "f",
            "regex",
            &ConstraintOptions {
                pattern: Some("(".to_string()),
                ..opts()
            },
        );
        assert!(matches!(result, Err(FormsError::Configuration(_))));
    }

    #[test]
    fn test_choice() {
        let rule = constraint_rule(
            "f",
            "choice",
            &ConstraintOptions {
                choices: Some(vec!["red".to_string(), "blue".to_string()]),
                ..opts()
            },
        )
        .unwrap();
        assert!(rule.validate(&Value::from("red")).is_ok());
        assert!(rule.validate(&Value::from("green")).is_err());
        assert!(rule
            .validate(&Value::List(vec![Value::from("red"), Value::from("blue")]))
            .is_ok());
        assert!(rule
            .validate(&Value::List(vec![Value::from("red"), Value::from("green")]))
            .is_err());
        assert!(rule.validate(&Value::Null).is_ok());
    }

    #[test]
    fn test_choice_requires_allowed() {
        assert!(matches!(
            constraint_rule("f", "choice", &opts()),
            Err(FormsError::Configuration(_))
        ));
    }

    #[test]
    fn test_custom_message() {
        let rule = constraint_rule(
            "f",
            "not_blank",
            &ConstraintOptions {
                message: Some("Please fill this in.".to_string()),
                ..opts()
            },
        )
        .unwrap();
        let err = rule.validate(&Value::Null).unwrap_err();
        assert_eq!(err.message, "Please fill this in.");
    }
}
