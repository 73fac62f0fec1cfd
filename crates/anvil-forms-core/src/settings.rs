//! Extension-level settings.
//!
//! [`Settings`] holds the configuration the extension itself needs (spool and
//! upload directories, mail defaults, logging), as opposed to the per-form
//! definitions which live in the config crate. Settings load from TOML with
//! unspecified fields falling back to defaults, and environment variables
//! take highest priority.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file or string (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `ANVIL_FORMS_DEBUG` | `debug` |
//! | `ANVIL_FORMS_LOG_LEVEL` | `log_level` |
//! | `ANVIL_FORMS_SPOOL_DIR` | `spool_dir` |
//! | `ANVIL_FORMS_UPLOAD_DIR` | `upload_dir` |
//! | `ANVIL_FORMS_TEMPLATES_DIR` | `templates_dir` |
//! | `ANVIL_FORMS_FROM_EMAIL` | `from_email` |
//! | `ANVIL_FORMS_SMTP_HOST` | `smtp.host` |
//! | `ANVIL_FORMS_SMTP_PORT` | `smtp.port` |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FormsError, FormsResult};

/// SMTP relay settings for spooled mail delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// SMTP relay hostname.
    pub host: String,
    /// SMTP relay port.
    pub port: u16,
    /// Optional SMTP username.
    pub username: Option<String>,
    /// Optional SMTP password.
    pub password: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25,
            username: None,
            password: None,
        }
    }
}

/// Extension-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Debug mode: pretty logs, verbose errors.
    pub debug: bool,
    /// Log filter directive (e.g. "info", "anvil_forms=debug").
    pub log_level: String,
    /// Directory where outgoing mail is durably queued.
    pub spool_dir: PathBuf,
    /// Directory where validated uploads are stored.
    pub upload_dir: PathBuf,
    /// Directory holding email body templates (Tera glob root).
    pub templates_dir: PathBuf,
    /// Default sender address for notification email.
    pub from_email: String,
    /// SMTP relay used by the spool delivery worker.
    pub smtp: SmtpSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            spool_dir: PathBuf::from("var/spool"),
            upload_dir: PathBuf::from("var/uploads"),
            templates_dir: PathBuf::from("templates"),
            from_email: "noreply@localhost".to_string(),
            smtp: SmtpSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from a TOML string.
    ///
    /// Fields not present in the TOML keep their default values.
    pub fn from_toml_str(toml_str: &str) -> FormsResult<Self> {
        // Two-step approach: parse the TOML into a serde_json::Value, then
        // merge it over the serialized defaults. This keeps defaults for any
        // settings the TOML does not specify.
        let toml_value: toml::Value = toml::from_str(toml_str)
            .map_err(|e| FormsError::Configuration(format!("Failed to parse TOML: {e}")))?;

        let json_value = toml_to_json(toml_value);
        let default_json = serde_json::to_value(Self::default()).map_err(|e| {
            FormsError::Configuration(format!("Failed to serialize default settings: {e}"))
        })?;

        let merged = merge_json(default_json, json_value);
        serde_json::from_value(merged).map_err(|e| {
            FormsError::Configuration(format!("Failed to deserialize settings: {e}"))
        })
    }

    /// Loads settings from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> FormsResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FormsError::Configuration(format!(
                "Failed to read settings file '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads settings from a TOML file, then applies environment overrides.
    pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> FormsResult<Self> {
        let mut settings = Self::from_toml_file(path)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Loads settings from environment variables only (starting from defaults).
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    /// Applies `ANVIL_FORMS_*` environment variable overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ANVIL_FORMS_DEBUG") {
            self.debug = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("ANVIL_FORMS_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Ok(v) = std::env::var("ANVIL_FORMS_SPOOL_DIR") {
            self.spool_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ANVIL_FORMS_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ANVIL_FORMS_TEMPLATES_DIR") {
            self.templates_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ANVIL_FORMS_FROM_EMAIL") {
            self.from_email = v;
        }
        if let Ok(v) = std::env::var("ANVIL_FORMS_SMTP_HOST") {
            self.smtp.host = v;
        }
        if let Ok(v) = std::env::var("ANVIL_FORMS_SMTP_PORT") {
            if let Ok(port) = v.parse() {
                self.smtp.port = port;
            }
        }
    }
}

/// Converts a `toml::Value` into a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Merges `overlay` onto `base`, recursing into objects.
fn merge_json(base: serde_json::Value, overlay: serde_json::Value) -> serde_json::Value {
    match (base, overlay) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => merge_json(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}
