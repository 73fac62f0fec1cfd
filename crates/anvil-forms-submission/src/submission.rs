//! Submission data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use anvil_forms_http::{FormData, UploadedFile};
use anvil_forms_storage::{Row, Value};

/// One visitor's submission of one form.
///
/// Created per request from the submitted body and discarded after
/// processing. `raw` holds the values as submitted; `cleaned` is filled by
/// field validation and is what the handlers consume.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The form this submission targets.
    pub form_name: String,
    /// Unique id for logging and stored-file naming.
    pub id: Uuid,
    /// When the submission was received.
    pub submitted_at: DateTime<Utc>,
    /// Raw submitted values, keyed by field name.
    pub raw: BTreeMap<String, String>,
    /// Uploaded files, keyed by field name.
    pub files: BTreeMap<String, UploadedFile>,
    /// Cleaned, validated values. Empty until field validation ran.
    pub cleaned: BTreeMap<String, Value>,
}

impl Submission {
    /// Creates an empty submission for the named form.
    pub fn new(form_name: impl Into<String>) -> Self {
        Self {
            form_name: form_name.into(),
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            raw: BTreeMap::new(),
            files: BTreeMap::new(),
            cleaned: BTreeMap::new(),
        }
    }

    /// Creates a submission from parsed form data, taking the last value
    /// for each field.
    pub fn from_form_data(form_name: impl Into<String>, data: &FormData) -> Self {
        let mut submission = Self::new(form_name);
        for (key, value) in data.iter() {
            submission.raw.insert(key.to_string(), value.to_string());
        }
        submission
    }

    /// Attaches an uploaded file under the given field name.
    #[must_use]
    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    /// Sets a raw value, for programmatic construction.
    #[must_use]
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw.insert(field.into(), value.into());
        self
    }

    /// Returns the raw submitted value for a field.
    pub fn raw_value(&self, field: &str) -> Option<&str> {
        self.raw.get(field).map(String::as_str)
    }

    /// Returns the cleaned value for a field.
    pub fn cleaned_value(&self, field: &str) -> Option<&Value> {
        self.cleaned.get(field)
    }

    /// Returns the cleaned values as a database row, with the submission
    /// timestamp added under `submitted_at`.
    pub fn to_row(&self) -> Row {
        let mut row = self.cleaned.clone();
        row.insert(
            "submitted_at".to_string(),
            Value::DateTime(self.submitted_at),
        );
        row
    }
}
