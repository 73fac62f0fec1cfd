//! Email notification handler.
//!
//! Renders the configured subject and body templates with the submission
//! context and queues the message on the mail backend. On the request path
//! the backend is the file spool, so "sent" here means durably queued.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use anvil_forms_config::NotificationConfig;
use anvil_forms_core::{FormsError, FormsResult};
use anvil_forms_mail::{EmailMessage, MailBackend};

use crate::submission::Submission;

/// Queues one notification email per submission.
pub struct EmailHandler {
    mailer: Arc<dyn MailBackend>,
    templates: Arc<tera::Tera>,
    default_from: String,
}

impl EmailHandler {
    /// Creates the handler over a mail backend and template set.
    pub fn new(
        mailer: Arc<dyn MailBackend>,
        templates: Arc<tera::Tera>,
        default_from: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            templates,
            default_from: default_from.into(),
        }
    }

    /// Renders and queues the notification for this submission.
    pub async fn handle(
        &self,
        notification: &NotificationConfig,
        submission: &Submission,
    ) -> FormsResult<()> {
        let context = submission_context(submission);

        let subject = tera::Tera::one_off(&notification.subject, &context, false)
            .map_err(|e| FormsError::Template(format!("Failed to render subject: {e}")))?;

        let body = match &notification.template {
            Some(name) => self
                .templates
                .render(name, &context)
                .map_err(|e| FormsError::Template(format!("Failed to render '{name}': {e}")))?,
            None => plain_body(submission),
        };

        let from = notification
            .from
            .clone()
            .unwrap_or_else(|| self.default_from.clone());

        let mut message = EmailMessage::new(subject, body, from, notification.to.clone())
            .header("X-Anvil-Form", &submission.form_name);
        for cc in &notification.cc {
            message = message.cc(cc);
        }
        for bcc in &notification.bcc {
            message = message.bcc(bcc);
        }
        if let Some(reply_to) = resolve_reply_to(notification, submission) {
            message = message.reply_to(reply_to);
        }

        let queued_id = self.mailer.send_message(&message).await?;
        info!(
            form = %submission.form_name,
            id = %submission.id,
            queued_id = %queued_id,
            "queued notification email"
        );
        Ok(())
    }
}

/// A `reply_to` naming a submitted field reads the visitor's value; any
/// other string is used literally.
fn resolve_reply_to(
    notification: &NotificationConfig,
    submission: &Submission,
) -> Option<String> {
    let reply_to = notification.reply_to.as_deref()?;
    match submission.cleaned_value(reply_to) {
        Some(value) if !value.is_null() => Some(value.to_string()),
        _ => Some(reply_to.to_string()),
    }
}

/// Builds the template context for one submission.
fn submission_context(submission: &Submission) -> tera::Context {
    let fields: BTreeMap<&str, String> = submission
        .cleaned
        .iter()
        .map(|(name, value)| (name.as_str(), value.to_string()))
        .collect();

    let mut context = tera::Context::new();
    context.insert("form", &submission.form_name);
    context.insert("fields", &fields);
    context.insert("submission_id", &submission.id.to_string());
    context.insert("submitted_at", &submission.submitted_at.to_rfc3339());
    context
}

/// Fallback plain-text body listing the submitted values.
fn plain_body(submission: &Submission) -> String {
    let mut body = format!(
        "New submission for form '{}':\n\n",
        submission.form_name
    );
    for (name, value) in &submission.cleaned {
        body.push_str(&format!("{name}: {value}\n"));
    }
    body
}
