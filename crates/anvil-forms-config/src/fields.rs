//! Field types and type-level value cleaning.
//!
//! [`FieldType`] is the closed set of field kinds a form may declare.
//! [`clean_value`] coerces one raw submitted string into a typed
//! [`Value`], applying the type's built-in checks (a `number` must parse, a
//! `date` must be ISO formatted). Declared constraints run afterwards, on
//! the cleaned value.

use serde::{Deserialize, Serialize};

use anvil_forms_storage::Value;

/// The type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text. Leading/trailing whitespace is stripped.
    Text,
    /// Multi-line text, kept verbatim.
    Textarea,
    /// An email address.
    Email,
    /// An http(s) URL.
    Url,
    /// An integer or floating-point number.
    Number,
    /// An ISO date (YYYY-MM-DD).
    Date,
    /// A checkbox; truthy inputs are "true", "1", "yes", "on".
    Checkbox,
    /// A field whose valid values come from a resolved choice set.
    Choice,
    /// A hidden value passed through unchanged.
    Hidden,
    /// A file upload; the cleaned value is the submitted filename.
    File,
}

impl FieldType {
    /// Returns the configuration name of this type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Email => "email",
            Self::Url => "url",
            Self::Number => "number",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Choice => "choice",
            Self::Hidden => "hidden",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cleans one raw submitted value into a typed [`Value`].
///
/// The pipeline per field:
/// 1. required check (empty or missing input on a required field);
/// 2. type coercion;
/// 3. type-specific built-in checks.
///
/// Returns the cleaned value or the list of error messages. An empty
/// optional field cleans to its `initial` value, or [`Value::Null`].
pub fn clean_value(
    field_type: FieldType,
    raw: Option<&str>,
    required: bool,
    initial: Option<&str>,
) -> Result<Value, Vec<String>> {
    let raw_str = raw.unwrap_or("");
    let is_empty = raw_str.is_empty();

    // Checkboxes are special: browsers omit unchecked boxes entirely
    if field_type == FieldType::Checkbox {
        let checked = matches!(
            raw_str.to_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        );
        if required && !checked {
            return Err(vec!["This field is required.".to_string()]);
        }
        return Ok(Value::Bool(checked));
    }

    if required && is_empty {
        return Err(vec!["This field is required.".to_string()]);
    }

    if is_empty {
        return Ok(initial.map_or(Value::Null, |v| Value::String(v.to_string())));
    }

    let mut errors = Vec::new();

    let value = match field_type {
        FieldType::Text => Value::String(raw_str.trim().to_string()),
        FieldType::Textarea | FieldType::Hidden | FieldType::Choice | FieldType::File => {
            Value::String(raw_str.to_string())
        }

        FieldType::Email => {
            if !email_like(raw_str) {
                errors.push("Enter a valid email address.".to_string());
            }
            Value::String(raw_str.to_string())
        }

        FieldType::Url => {
            if !(raw_str.starts_with("http://") || raw_str.starts_with("https://")) {
                errors.push("Enter a valid URL.".to_string());
            }
            Value::String(raw_str.to_string())
        }

        FieldType::Number => match raw_str.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => match raw_str.parse::<f64>() {
                Ok(n) => Value::Float(n),
                Err(_) => {
                    errors.push("Enter a number.".to_string());
                    Value::Null
                }
            },
        },

        FieldType::Date => match chrono::NaiveDate::parse_from_str(raw_str, "%Y-%m-%d") {
            Ok(d) => Value::Date(d),
            Err(_) => {
                errors.push("Enter a valid date (YYYY-MM-DD).".to_string());
                Value::Null
            }
        },

        FieldType::Checkbox => unreachable!("handled above"),
    };

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

/// Cheap shape check; the `email` constraint does the strict validation.
fn email_like(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_strips_whitespace() {
        let value = clean_value(FieldType::Text, Some("  Alice  "), true, None).unwrap();
        assert_eq!(value, Value::String("Alice".to_string()));
    }

    #[test]
    fn test_textarea_kept_verbatim() {
        let value = clean_value(FieldType::Textarea, Some("  line\nline  "), true, None).unwrap();
        assert_eq!(value, Value::String("  line\nline  ".to_string()));
    }

    #[test]
    fn test_required_empty() {
        let result = clean_value(FieldType::Text, Some(""), true, None);
        assert_eq!(result.unwrap_err(), vec!["This field is required."]);

        let result = clean_value(FieldType::Text, None, true, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_optional_empty_uses_initial() {
        let value = clean_value(FieldType::Text, Some(""), false, Some("anonymous")).unwrap();
        assert_eq!(value, Value::String("anonymous".to_string()));

        let value = clean_value(FieldType::Text, None, false, None).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_email_validation() {
        assert!(clean_value(FieldType::Email, Some("a@b.com"), true, None).is_ok());
        let result = clean_value(FieldType::Email, Some("not-an-email"), true, None);
        assert!(result.unwrap_err()[0].contains("valid email"));
    }

    #[test]
    fn test_url_validation() {
        assert!(clean_value(FieldType::Url, Some("https://example.com"), true, None).is_ok());
        assert!(clean_value(FieldType::Url, Some("example.com"), true, None).is_err());
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(
            clean_value(FieldType::Number, Some("42"), true, None).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            clean_value(FieldType::Number, Some("2.5"), true, None).unwrap(),
            Value::Float(2.5)
        );
        assert!(clean_value(FieldType::Number, Some("abc"), true, None).is_err());
    }

    #[test]
    fn test_date_coercion() {
        let value = clean_value(FieldType::Date, Some("2024-01-15"), true, None).unwrap();
        assert!(matches!(value, Value::Date(_)));
        assert!(clean_value(FieldType::Date, Some("15/01/2024"), true, None).is_err());
    }

    #[test]
    fn test_checkbox() {
        for truthy in ["true", "1", "yes", "on", "ON"] {
            assert_eq!(
                clean_value(FieldType::Checkbox, Some(truthy), false, None).unwrap(),
                Value::Bool(true)
            );
        }
        // Browsers omit unchecked boxes entirely
        assert_eq!(
            clean_value(FieldType::Checkbox, None, false, None).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_checkbox_required_must_be_checked() {
        assert!(clean_value(FieldType::Checkbox, None, true, None).is_err());
        assert!(clean_value(FieldType::Checkbox, Some("on"), true, None).is_ok());
    }

    #[test]
    fn test_choice_passes_raw_string() {
        let value = clean_value(FieldType::Choice, Some("gum-tree"), true, None).unwrap();
        assert_eq!(value, Value::String("gum-tree".to_string()));
    }

    #[test]
    fn test_field_type_serde_names() {
        let ft: FieldType = serde_json::from_str("\"textarea\"").unwrap();
        assert_eq!(ft, FieldType::Textarea);
        assert_eq!(FieldType::Choice.to_string(), "choice");
    }
}
