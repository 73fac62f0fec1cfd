//! Resolved choice sets and resolver parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One selectable choice: a stable value key and a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// The stored/submitted value.
    pub value: String,
    /// The label shown to the visitor.
    pub label: String,
}

impl Choice {
    /// Creates a choice from a value and label.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Resolver parameters from a field's `params` configuration entry.
///
/// `params` tunes how a resolver builds its set; it is consumed during
/// resolution and never appears in the finalized field options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceParams {
    /// Sort key: `"label"`, `"value"`, or (for content choices) a record
    /// attribute name.
    pub sort: Option<String>,
    /// Maximum number of choices to keep after sorting.
    pub limit: Option<usize>,
    /// Attribute to group choices by.
    pub group_by: Option<String>,
    /// Values to mark as preferred (rendered at the top of the list).
    pub preferred: Vec<String>,
    /// Per-choice HTML attributes, keyed by choice value.
    pub attr: BTreeMap<String, BTreeMap<String, String>>,
}

/// A fully resolved set of choices for one field.
///
/// Built fresh on each resolution call; the field options layer caches the
/// result for the lifetime of the options object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceSet {
    /// The field this set was resolved for.
    pub name: String,
    /// Ordered `(value, label)` choices.
    pub choices: Vec<Choice>,
    /// Attribute the choices are grouped by, if any.
    pub group_by: Option<String>,
    /// Values marked as preferred.
    pub preferred: Vec<String>,
    /// Per-choice HTML attributes, keyed by choice value.
    pub attr: BTreeMap<String, BTreeMap<String, String>>,
    /// For content-derived sets, the attribute the values came from.
    pub value_field: Option<String>,
    /// For content-derived sets, the attribute the labels came from.
    pub label_field: Option<String>,
}

impl ChoiceSet {
    /// Creates an empty set for the named field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the label for a value, if the value is in the set.
    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.label.as_str())
    }

    /// Returns `true` if the given value is a member of this set.
    pub fn contains_value(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c.value == value)
    }

    /// Returns the values in order.
    pub fn values(&self) -> Vec<&str> {
        self.choices.iter().map(|c| c.value.as_str()).collect()
    }

    /// Returns the number of choices.
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Returns `true` if the set has no choices.
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Applies sort (by `"label"`/`"value"`), limit, and the
    /// grouping/preferred/attr params to this set.
    pub(crate) fn apply_params(&mut self, params: &ChoiceParams) {
        match params.sort.as_deref() {
            Some("label") => self.choices.sort_by(|a, b| a.label.cmp(&b.label)),
            Some("value") => self.choices.sort_by(|a, b| a.value.cmp(&b.value)),
            _ => {}
        }
        if let Some(limit) = params.limit {
            self.choices.truncate(limit);
        }
        self.group_by = params.group_by.clone();
        self.preferred = params.preferred.clone();
        self.attr = params.attr.clone();
    }
}
