//! The choice specification mini-language.
//!
//! String values of a field's `choices` entry select a dynamic choice
//! source:
//!
//! - `content::<contenttype>::<valueField>::<labelField>` — records of a
//!   content type, mapped through two attributes.
//! - `contenttype::<contenttype>::<labelField>::<valueField>` — legacy alias
//!   for the same source. Note the swapped attribute order; parsing logs a
//!   deprecation warning.
//! - `event` or `event::<prefix>` — names registered on the event
//!   dispatcher, optionally filtered by prefix.
//!
//! Any other string is treated as a static value. A `content`-prefixed
//! string with the wrong segment count is a configuration error, never an
//! empty choice set.

use anvil_forms_core::{FormsError, FormsResult};
use tracing::warn;

/// A parsed choice specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceSpec {
    /// Choices come from the records of a content type.
    Content {
        /// The content type to fetch.
        content_type: String,
        /// The attribute used as the stored value.
        value_field: String,
        /// The attribute used as the display label.
        label_field: String,
        /// Parsed from the legacy `contenttype::` alias.
        legacy: bool,
    },
    /// Choices are the registered event names, optionally prefix-filtered.
    Event {
        /// Only event names starting with this prefix are included.
        filter: Option<String>,
    },
    /// Not a specification; the raw value is a static choice.
    Static,
}

impl ChoiceSpec {
    /// Parses a raw `choices` string.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::InvalidChoiceSpec`] when a `content`- or
    /// `contenttype`-prefixed string does not have exactly four segments.
    pub fn parse(raw: &str) -> FormsResult<Self> {
        if raw.starts_with("contenttype::") {
            warn!(spec = raw, "'contenttype::' choice specs are deprecated, use 'content::'");
            let (content_type, second, third) = content_segments(raw)?;
            return Ok(Self::Content {
                content_type,
                // Legacy alias carries label before value
                value_field: third,
                label_field: second,
                legacy: true,
            });
        }

        if raw.starts_with("content") {
            let (content_type, second, third) = content_segments(raw)?;
            return Ok(Self::Content {
                content_type,
                value_field: second,
                label_field: third,
                legacy: false,
            });
        }

        if raw.starts_with("event") {
            let filter = raw
                .strip_prefix("event")
                .and_then(|rest| rest.strip_prefix("::"))
                .filter(|rest| !rest.is_empty())
                .map(str::to_string);
            return Ok(Self::Event { filter });
        }

        Ok(Self::Static)
    }
}

/// Splits a content spec into its three payload segments, validating shape.
fn content_segments(raw: &str) -> FormsResult<(String, String, String)> {
    let segments: Vec<&str> = raw.split("::").collect();
    if segments.len() != 4 || segments.iter().any(|s| s.is_empty()) {
        return Err(FormsError::InvalidChoiceSpec(format!(
            "'{raw}' must have the form '<prefix>::<contenttype>::<field>::<field>'"
        )));
    }
    Ok((
        segments[1].to_string(),
        segments[2].to_string(),
        segments[3].to_string(),
    ))
}
