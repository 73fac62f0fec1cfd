//! Outgoing email messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An outgoing email message.
///
/// Serializable so it can sit on the file spool between the request that
/// queued it and the worker that delivers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// The subject line.
    pub subject: String,
    /// The plain-text body.
    pub body: String,
    /// The sender address.
    pub from: String,
    /// Primary recipients.
    pub to: Vec<String>,
    /// CC recipients.
    #[serde(default)]
    pub cc: Vec<String>,
    /// BCC recipients.
    #[serde(default)]
    pub bcc: Vec<String>,
    /// Optional reply-to address.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Additional headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl EmailMessage {
    /// Creates a message with a subject, body, sender, and recipients.
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        from: impl Into<String>,
        to: Vec<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            from: from.into(),
            to,
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: None,
            headers: BTreeMap::new(),
        }
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Sets the reply-to address.
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Sets a header value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns the total number of recipients (to + cc + bcc).
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}
