//! Error types for the anvil-forms extension.
//!
//! The [`FormsError`] enum covers every failure category the extension can
//! produce: configuration errors (malformed choice specifications, unknown
//! constraint names), validation errors, handler errors, upload errors, and
//! the supporting storage/mail/template/routing failures. Nothing here is
//! fatal to the host process; every failure degrades to a re-rendered form
//! with feedback.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A validation failure with an optional set of per-field errors.
///
/// Validation errors are either simple (one message and a short code) or
/// compound (a mapping of field names to error lists collected during a
/// submission validation pass).
///
/// # Examples
///
/// ```
/// use anvil_forms_core::error::ValidationError;
///
/// let err = ValidationError::new("This value should not be blank.", "not_blank");
/// assert_eq!(err.code, "not_blank");
/// ```
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failed rule (e.g. "not_blank", "length").
    pub code: String,
    /// Additional parameters giving context for the message.
    pub params: HashMap<String, String>,
    /// Per-field errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` that carries per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Adds a context parameter to this error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut first = true;
            for (field, errors) in &self.field_errors {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for the anvil-forms extension.
#[derive(Error, Debug)]
pub enum FormsError {
    // ── Configuration ────────────────────────────────────────────────
    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A choice specification string could not be parsed.
    #[error("Invalid choices specification: {0}")]
    InvalidChoiceSpec(String),

    /// A constraint declaration names a rule that does not exist.
    #[error("Unknown constraint '{name}' on form '{form}'")]
    UnknownConstraint {
        /// The form whose field declared the constraint.
        form: String,
        /// The unrecognized constraint name.
        name: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    /// One or more submitted values failed their declared constraints.
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    // ── Submission handling ──────────────────────────────────────────
    /// A submission handler failed during dispatch.
    #[error("Handler '{handler}' failed: {message}")]
    Handler {
        /// The handler that failed.
        handler: String,
        /// A description of the failure.
        message: String,
    },

    /// An uploaded file violated the configured upload policy.
    #[error("Upload error: {0}")]
    Upload(String),

    // ── Collaborators ────────────────────────────────────────────────
    /// The content storage layer reported a failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A mail message could not be built or queued.
    #[error("Mail error: {0}")]
    Mail(String),

    /// An email template failed to render.
    #[error("Template error: {0}")]
    Template(String),

    /// A named route could not be resolved to a URL.
    #[error("Routing error: {0}")]
    Routing(String),

    // ── Serialization / IO ───────────────────────────────────────────
    /// A value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred (spool or upload directory access).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormsError {
    /// Returns `true` for errors raised by bad configuration rather than
    /// by a submission at runtime.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::InvalidChoiceSpec(_) | Self::UnknownConstraint { .. }
        )
    }
}

/// A convenience alias for `Result<T, FormsError>`.
pub type FormsResult<T> = Result<T, FormsError>;
