//! Form definitions.
//!
//! [`FormsConfig`] is the parsed set of form declarations from the host's
//! configuration. Handler names resolve to the closed [`HandlerKind`] enum
//! at load time, and [`FormsConfig::validate`] checks that every declared
//! handler has the target configuration it needs — a misdeclared form fails
//! when configuration loads, not when a visitor submits.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use anvil_forms_choices::{ChoiceParams, ChoiceSource};
use anvil_forms_core::{FormsError, FormsResult};

use crate::constraints::ConstraintOptions;
use crate::fields::FieldType;

/// The closed set of submission handlers a form may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// Create a typed content record from the submission.
    Content,
    /// Insert a row into a database table.
    Database,
    /// Queue a notification email.
    Email,
    /// Redirect the visitor after a successful submission.
    Redirect,
    /// Store uploaded files.
    Upload,
}

impl HandlerKind {
    /// Returns the configuration name of this handler.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Database => "database",
            Self::Email => "email",
            Self::Redirect => "redirect",
            Self::Upload => "upload",
        }
    }
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The full set of form declarations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormsConfig {
    /// Declared forms, keyed by form name.
    #[serde(default)]
    pub forms: BTreeMap<String, FormConfig>,
}

impl FormsConfig {
    /// Parses and validates form declarations from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> FormsResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            FormsError::Configuration(format!("Failed to parse forms configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates form declarations from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> FormsResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FormsError::Configuration(format!(
                "Failed to read forms configuration '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Returns the configuration of the named form.
    pub fn get(&self, form_name: &str) -> Option<&FormConfig> {
        self.forms.get(form_name)
    }

    /// Returns the declared form names.
    pub fn form_names(&self) -> Vec<&str> {
        self.forms.keys().map(String::as_str).collect()
    }

    /// Checks cross-references: every declared handler must have the target
    /// configuration it acts on, and field names must be unique.
    pub fn validate(&self) -> FormsResult<()> {
        for (name, form) in &self.forms {
            form.validate(name)?;
        }
        Ok(())
    }
}

/// One form's declaration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormConfig {
    /// The handlers to dispatch a valid submission to.
    #[serde(default)]
    pub handlers: Vec<HandlerKind>,
    /// The form's fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    /// Email notification target (required by the `email` handler).
    #[serde(default)]
    pub notification: Option<NotificationConfig>,
    /// Database table target (required by the `database` handler).
    #[serde(default)]
    pub database: Option<DatabaseTarget>,
    /// Content record target (required by the `content` handler).
    #[serde(default)]
    pub content: Option<ContentTarget>,
    /// Redirect target (required by the `redirect` handler).
    #[serde(default)]
    pub redirect: Option<RedirectTarget>,
    /// Upload policy (required by the `upload` handler).
    #[serde(default)]
    pub uploads: Option<UploadPolicy>,
    /// Feedback message overrides.
    #[serde(default)]
    pub feedback: FeedbackMessages,
}

impl FormConfig {
    /// Returns the named field's configuration.
    pub fn field(&self, field_name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == field_name)
    }

    /// Returns `true` if the form declares the given handler.
    pub fn declares(&self, kind: HandlerKind) -> bool {
        self.handlers.contains(&kind)
    }

    fn validate(&self, form_name: &str) -> FormsResult<()> {
        if self.fields.is_empty() {
            return Err(FormsError::Configuration(format!(
                "Form '{form_name}' declares no fields"
            )));
        }

        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(FormsError::Configuration(format!(
                    "Form '{form_name}' declares field '{}' more than once",
                    field.name
                )));
            }
        }

        let require = |present: bool, kind: HandlerKind, section: &str| {
            if present {
                Ok(())
            } else {
                Err(FormsError::Configuration(format!(
                    "Form '{form_name}' declares the '{kind}' handler but has no [{section}] section"
                )))
            }
        };

        for kind in &self.handlers {
            match kind {
                HandlerKind::Content => require(self.content.is_some(), *kind, "content")?,
                HandlerKind::Database => require(self.database.is_some(), *kind, "database")?,
                HandlerKind::Email => require(self.notification.is_some(), *kind, "notification")?,
                HandlerKind::Redirect => require(self.redirect.is_some(), *kind, "redirect")?,
                HandlerKind::Upload => require(self.uploads.is_some(), *kind, "uploads")?,
            }
        }

        if let Some(notification) = &self.notification {
            if notification.to.is_empty() {
                return Err(FormsError::Configuration(format!(
                    "Form '{form_name}' has a notification with no recipients"
                )));
            }
        }

        if let Some(redirect) = &self.redirect {
            redirect.validate(form_name)?;
        }

        Ok(())
    }
}

/// One field's declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// The field name (submission key).
    pub name: String,
    /// The field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether the field must be filled in.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Placeholder text.
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Help text shown alongside the field.
    #[serde(default)]
    pub help: Option<String>,
    /// Default value used when an optional field is left empty.
    #[serde(default)]
    pub initial: Option<String>,
    /// Extra HTML attributes.
    #[serde(default)]
    pub attr: BTreeMap<String, String>,
    /// The choice source for `choice`-typed fields: a specification string,
    /// a plain list, or a value-to-label mapping.
    #[serde(default)]
    pub choices: Option<ChoicesEntry>,
    /// Resolver parameters, consumed during choice resolution.
    #[serde(default)]
    pub params: ChoiceParams,
    /// Constraint declarations.
    #[serde(default)]
    pub constraints: Option<ConstraintsEntry>,
}

impl FieldConfig {
    /// Creates a minimal field declaration, for tests and programmatic use.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: None,
            required: true,
            placeholder: None,
            help: None,
            initial: None,
            attr: BTreeMap::new(),
            choices: None,
            params: ChoiceParams::default(),
            constraints: None,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// A field's `choices` configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoicesEntry {
    /// A specification string (`content::...`, `event`, or a static value).
    Spec(String),
    /// A plain list; each entry is both value and label.
    List(Vec<String>),
    /// A value-to-label mapping.
    Map(BTreeMap<String, String>),
}

impl ChoicesEntry {
    /// Converts this entry into the resolver input.
    pub fn to_source(&self) -> ChoiceSource {
        match self {
            Self::Spec(raw) => ChoiceSource::Spec(raw.clone()),
            Self::List(values) => ChoiceSource::Inline(
                values.iter().map(|v| (v.clone(), v.clone())).collect(),
            ),
            Self::Map(entries) => ChoiceSource::Inline(
                entries.iter().map(|(v, l)| (v.clone(), l.clone())).collect(),
            ),
        }
    }
}

/// A field's `constraints` configuration entry.
///
/// Either a single constraint name or a list of declarations. Both shapes
/// normalize to the same internal representation through
/// [`ConstraintsEntry::declarations`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConstraintsEntry {
    /// A single bare constraint name.
    Single(String),
    /// An ordered list of declarations.
    List(Vec<ConstraintDecl>),
}

/// One constraint declaration within a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConstraintDecl {
    /// A bare name with default options.
    Name(String),
    /// A name-to-options mapping (typically single-key).
    WithOptions(BTreeMap<String, ConstraintOptions>),
}

impl ConstraintsEntry {
    /// Normalizes the entry into ordered `(name, options)` declarations.
    pub fn declarations(&self) -> Vec<(String, ConstraintOptions)> {
        match self {
            Self::Single(name) => vec![(name.clone(), ConstraintOptions::default())],
            Self::List(decls) => decls
                .iter()
                .flat_map(|decl| match decl {
                    ConstraintDecl::Name(name) => {
                        vec![(name.clone(), ConstraintOptions::default())]
                    }
                    ConstraintDecl::WithOptions(map) => {
                        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
                    }
                })
                .collect(),
        }
    }
}

/// Email notification target for the `email` handler.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Sender override; the extension-wide `from_email` applies otherwise.
    #[serde(default)]
    pub from: Option<String>,
    /// Recipients.
    pub to: Vec<String>,
    /// CC recipients.
    #[serde(default)]
    pub cc: Vec<String>,
    /// BCC recipients.
    #[serde(default)]
    pub bcc: Vec<String>,
    /// Reply-to address, or the name of a submitted field to read it from.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Subject template (inline, rendered with the submission context).
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Body template name under the templates directory; a built-in
    /// plain-text listing is used when absent.
    #[serde(default)]
    pub template: Option<String>,
}

fn default_subject() -> String {
    "New {{ form }} submission".to_string()
}

/// Database table target for the `database` handler.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseTarget {
    /// The table submissions are inserted into.
    pub table: String,
}

/// Content record target for the `content` handler.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentTarget {
    /// The content type new records are created as.
    pub content_type: String,
}

/// Redirect target for the `redirect` handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectTarget {
    /// A literal URL to redirect to.
    #[serde(default)]
    pub url: Option<String>,
    /// A named route to reverse.
    #[serde(default)]
    pub route: Option<String>,
    /// Parameters substituted into the route template.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl RedirectTarget {
    fn validate(&self, form_name: &str) -> FormsResult<()> {
        match (&self.url, &self.route) {
            (Some(_), Some(_)) => Err(FormsError::Configuration(format!(
                "Form '{form_name}' redirect declares both a url and a route"
            ))),
            (None, None) => Err(FormsError::Configuration(format!(
                "Form '{form_name}' redirect declares neither a url nor a route"
            ))),
            _ => Ok(()),
        }
    }
}

/// Upload policy for the `upload` handler.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadPolicy {
    /// Maximum file size in bytes.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Allowed file extensions (lowercase, without dots). Empty allows any.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            allowed_extensions: Vec::new(),
        }
    }
}

const fn default_max_size() -> usize {
    2_621_440
}

/// Feedback messages pushed after processing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackMessages {
    /// Message shown after a fully successful submission.
    pub success: String,
    /// Message shown when validation or a handler failed.
    pub error: String,
}

impl Default for FeedbackMessages {
    fn default() -> Self {
        Self {
            success: "Thank you, your submission was received.".to_string(),
            error: "Sorry, there was a problem with your submission.".to_string(),
        }
    }
}
