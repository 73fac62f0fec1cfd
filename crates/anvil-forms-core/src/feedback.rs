//! Per-form feedback messages.
//!
//! [`Feedback`] is a flash-style message bag: submission processing pushes
//! success or failure messages keyed by form name, and the next render of
//! that form drains them. Messages are one-time; reading consumes them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// The severity level of a feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    /// Debug-level message, typically not shown in production.
    Debug,
    /// Informational message.
    Info,
    /// Success notification (e.g. "Your message was sent").
    Success,
    /// Warning that requires attention.
    Warning,
    /// Error message indicating a failure.
    Error,
}

impl MessageLevel {
    /// Returns the CSS tag class for this level.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single feedback message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The severity level of this message.
    pub level: MessageLevel,
    /// The message text.
    pub text: String,
}

impl Message {
    /// Creates a new message with the given level and text.
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A shared, per-form flash message bag.
///
/// Cloning a `Feedback` shares the underlying storage, so the registry can
/// hand the same bag to the processor and to the host's render path.
///
/// # Examples
///
/// ```
/// use anvil_forms_core::feedback::{Feedback, MessageLevel};
///
/// let feedback = Feedback::new();
/// feedback.success("contact", "Your message was sent.");
///
/// let messages = feedback.drain("contact");
/// assert_eq!(messages.len(), 1);
/// assert!(feedback.drain("contact").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Feedback {
    bags: Arc<Mutex<HashMap<String, Vec<Message>>>>,
}

impl Feedback {
    /// Creates a new empty feedback bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message for the given form.
    pub fn add(&self, form: &str, level: MessageLevel, text: &str) {
        self.bags
            .lock()
            .expect("feedback lock poisoned")
            .entry(form.to_string())
            .or_default()
            .push(Message::new(level, text));
    }

    /// Adds an info-level message for the given form.
    pub fn info(&self, form: &str, text: &str) {
        self.add(form, MessageLevel::Info, text);
    }

    /// Adds a success-level message for the given form.
    pub fn success(&self, form: &str, text: &str) {
        self.add(form, MessageLevel::Success, text);
    }

    /// Adds a warning-level message for the given form.
    pub fn warning(&self, form: &str, text: &str) {
        self.add(form, MessageLevel::Warning, text);
    }

    /// Adds an error-level message for the given form.
    pub fn error(&self, form: &str, text: &str) {
        self.add(form, MessageLevel::Error, text);
    }

    /// Drains and returns all messages for the given form.
    ///
    /// After this call the form's bag is empty.
    pub fn drain(&self, form: &str) -> Vec<Message> {
        self.bags
            .lock()
            .expect("feedback lock poisoned")
            .remove(form)
            .unwrap_or_default()
    }

    /// Returns the messages for the given form without consuming them.
    pub fn peek(&self, form: &str) -> Vec<Message> {
        self.bags
            .lock()
            .expect("feedback lock poisoned")
            .get(form)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of pending messages for the given form.
    pub fn len(&self, form: &str) -> usize {
        self.peek(form).len()
    }

    /// Returns `true` if the given form has no pending messages.
    pub fn is_empty(&self, form: &str) -> bool {
        self.len(form) == 0
    }
}
