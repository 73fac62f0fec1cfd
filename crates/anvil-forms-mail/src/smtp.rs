//! SMTP delivery backend.
//!
//! [`SmtpBackend`] is the delivery side of the spool: the out-of-process
//! worker drains queued messages through it via
//! [`flush_spool`](crate::spool::flush_spool). The request path never uses
//! this backend directly.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use anvil_forms_core::settings::SmtpSettings;
use anvil_forms_core::{FormsError, FormsResult};

use crate::backend::MailBackend;
use crate::message::EmailMessage;

/// A [`MailBackend`] that relays messages over SMTP.
///
/// Custom headers on an [`EmailMessage`] are preserved on the spool but not
/// forwarded to the relay.
pub struct SmtpBackend {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpBackend {
    /// Creates a backend for the given relay host and port, with optional
    /// credentials.
    pub fn new(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
    ) -> FormsResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| FormsError::Mail(format!("Invalid SMTP relay '{host}': {e}")))?
            .port(port);

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    /// Creates a backend from extension settings.
    pub fn from_settings(settings: &SmtpSettings) -> FormsResult<Self> {
        Self::new(
            &settings.host,
            settings.port,
            settings.username.as_deref(),
            settings.password.as_deref(),
        )
    }
}

#[async_trait]
impl MailBackend for SmtpBackend {
    async fn send_message(&self, message: &EmailMessage) -> FormsResult<String> {
        let email = to_lettre(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| FormsError::Mail(format!("SMTP delivery failed: {e}")))?;
        Ok(response.code().to_string())
    }
}

/// Converts an [`EmailMessage`] into a lettre message.
fn to_lettre(message: &EmailMessage) -> FormsResult<lettre::Message> {
    if message.to.is_empty() {
        return Err(FormsError::Mail(
            "Message has no recipients".to_string(),
        ));
    }

    let mut builder = lettre::Message::builder()
        .from(parse_mailbox(&message.from)?)
        .subject(message.subject.clone());

    for to in &message.to {
        builder = builder.to(parse_mailbox(to)?);
    }
    for cc in &message.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }
    for bcc in &message.bcc {
        builder = builder.bcc(parse_mailbox(bcc)?);
    }
    if let Some(reply_to) = &message.reply_to {
        builder = builder.reply_to(parse_mailbox(reply_to)?);
    }

    builder
        .body(message.body.clone())
        .map_err(|e| FormsError::Mail(format!("Failed to build message: {e}")))
}

/// Parses an address like `"Name <user@example.com>"` or `"user@example.com"`.
fn parse_mailbox(address: &str) -> FormsResult<Mailbox> {
    address
        .parse()
        .map_err(|e| FormsError::Mail(format!("Invalid email address '{address}': {e}")))
}
