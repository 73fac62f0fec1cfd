//! The submission processing pipeline.
//!
//! [`Processor::process`] runs one submission through a fixed, linear
//! sequence:
//!
//! 1. **Validate fields** — resolve each field's options and run its
//!    constraints against the submitted values. Any failure stops the
//!    pipeline before side effects.
//! 2. **Dispatch handlers** — invoke the form's declared handlers.
//!    Handlers are independent side effects and dispatch is best-effort: a
//!    failure is logged and recorded, and the remaining handlers still run.
//! 3. **Emit feedback** — push a success or failure message into the
//!    form's message bag.
//! 4. **Redirect** — when configured and everything succeeded, resolve the
//!    redirect target; otherwise the caller re-renders the form.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, warn, Instrument};

use anvil_forms_config::{clean_value, FieldOptions, FormConfig, FormsConfig, HandlerKind};
use anvil_forms_core::logging::submission_span;
use anvil_forms_core::{Feedback, FormsError, FormsResult};
use anvil_forms_events::EventDispatcher;
use anvil_forms_storage::{ContentStorage, Value};

use crate::handlers::HandlerSet;
use crate::submission::Submission;

/// Non-redirect handlers run in a fixed order, uploads first so stored
/// file paths are visible to the persistence and email handlers.
const DISPATCH_ORDER: [HandlerKind; 4] = [
    HandlerKind::Upload,
    HandlerKind::Content,
    HandlerKind::Database,
    HandlerKind::Email,
];

/// The result of processing one submission.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// The form that was processed.
    pub form_name: String,
    /// Per-field validation errors. Non-empty means no handler ran.
    pub errors: BTreeMap<String, Vec<String>>,
    /// Handlers that failed during dispatch, with their error messages.
    pub handler_failures: Vec<(HandlerKind, String)>,
    /// The resolved redirect URL, when configured and everything succeeded.
    pub redirect: Option<String>,
    /// Paths of files stored by the upload handler.
    pub stored_uploads: Vec<PathBuf>,
}

impl ProcessOutcome {
    fn new(form_name: impl Into<String>) -> Self {
        Self {
            form_name: form_name.into(),
            errors: BTreeMap::new(),
            handler_failures: Vec::new(),
            redirect: None,
            stored_uploads: Vec::new(),
        }
    }

    /// Returns `true` if field validation passed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` if validation passed and every handler succeeded.
    pub fn succeeded(&self) -> bool {
        self.is_valid() && self.handler_failures.is_empty()
    }
}

/// Sequences validation, handler dispatch, feedback, and redirect for
/// submissions. Constructed once by the registry and shared.
pub struct Processor {
    config: Arc<FormsConfig>,
    storage: Arc<dyn ContentStorage>,
    events: Arc<EventDispatcher>,
    feedback: Feedback,
    handlers: Arc<HandlerSet>,
}

impl Processor {
    /// Creates a processor over the shared collaborators.
    pub fn new(
        config: Arc<FormsConfig>,
        storage: Arc<dyn ContentStorage>,
        events: Arc<EventDispatcher>,
        feedback: Feedback,
        handlers: Arc<HandlerSet>,
    ) -> Self {
        Self {
            config,
            storage,
            events,
            feedback,
            handlers,
        }
    }

    /// Processes one submission through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown form name or a configuration
    /// problem surfacing during options resolution. Handler failures are
    /// not errors; they are recorded on the outcome.
    pub async fn process(&self, submission: &mut Submission) -> FormsResult<ProcessOutcome> {
        let span = submission_span(&submission.form_name, &submission.id.to_string());
        self.process_pipeline(submission).instrument(span).await
    }

    async fn process_pipeline(
        &self,
        submission: &mut Submission,
    ) -> FormsResult<ProcessOutcome> {
        let form = self.config.get(&submission.form_name).ok_or_else(|| {
            FormsError::Configuration(format!("Unknown form '{}'", submission.form_name))
        })?;

        let mut outcome = ProcessOutcome::new(&submission.form_name);

        // 1. Validate. A failing constraint stops everything before side
        //    effects: no row, no email, no stored file.
        outcome.errors = self.validate_fields(form, submission).await?;
        if !outcome.errors.is_empty() {
            debug!(
                form = %submission.form_name,
                fields = ?outcome.errors.keys().collect::<Vec<_>>(),
                "submission failed validation"
            );
            self.feedback
                .error(&submission.form_name, &form.feedback.error);
            return Ok(outcome);
        }

        // 2. Dispatch, best-effort.
        for kind in DISPATCH_ORDER {
            if !form.declares(kind) {
                continue;
            }
            if let Err(e) = self.dispatch(kind, form, submission, &mut outcome).await {
                error!(
                    form = %submission.form_name,
                    handler = %kind,
                    error = %e,
                    "submission handler failed"
                );
                outcome.handler_failures.push((kind, e.to_string()));
            }
        }

        self.events.dispatch(
            "anvilforms.submitted",
            &serde_json::json!({
                "form": submission.form_name,
                "id": submission.id.to_string(),
                "succeeded": outcome.handler_failures.is_empty(),
            }),
        );

        // 3. Feedback.
        if outcome.handler_failures.is_empty() {
            self.feedback
                .success(&submission.form_name, &form.feedback.success);
        } else {
            self.feedback
                .error(&submission.form_name, &form.feedback.error);
        }

        // 4. Redirect, only on full success.
        if form.declares(HandlerKind::Redirect) && outcome.handler_failures.is_empty() {
            if let Some(target) = &form.redirect {
                match self.handlers.redirect.resolve(target) {
                    Ok(url) => outcome.redirect = Some(url),
                    Err(e) => {
                        warn!(
                            form = %submission.form_name,
                            error = %e,
                            "redirect resolution failed, re-rendering instead"
                        );
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Resolves each field's options and validates the submitted values.
    ///
    /// Errors accumulate across fields; valid values land in
    /// `submission.cleaned`.
    async fn validate_fields(
        &self,
        form: &FormConfig,
        submission: &mut Submission,
    ) -> FormsResult<BTreeMap<String, Vec<String>>> {
        let mut errors = BTreeMap::new();

        for field in &form.fields {
            let options = FieldOptions::new(
                submission.form_name.clone(),
                field.clone(),
                Arc::clone(&self.storage),
                Arc::clone(&self.events),
            );
            let resolved = options.options().await?;

            let raw = submission.raw_value(&field.name);
            match clean_value(field.field_type, raw, field.required, field.initial.as_deref()) {
                Ok(value) => {
                    let rule_errors = resolved.validate(&value);
                    if rule_errors.is_empty() {
                        submission.cleaned.insert(field.name.clone(), value);
                    } else {
                        errors.insert(field.name.clone(), rule_errors);
                    }
                }
                Err(field_errors) => {
                    errors.insert(field.name.clone(), field_errors);
                }
            }
        }

        Ok(errors)
    }

    async fn dispatch(
        &self,
        kind: HandlerKind,
        form: &FormConfig,
        submission: &mut Submission,
        outcome: &mut ProcessOutcome,
    ) -> FormsResult<()> {
        match kind {
            HandlerKind::Upload => self.run_upload(form, submission, outcome).await,
            HandlerKind::Content => {
                let target = form.content.as_ref().ok_or_else(|| {
                    FormsError::Configuration("content handler without a target".to_string())
                })?;
                self.handlers.content.handle(target, submission).await
            }
            HandlerKind::Database => {
                let target = form.database.as_ref().ok_or_else(|| {
                    FormsError::Configuration("database handler without a target".to_string())
                })?;
                self.handlers.database.handle(target, submission).await
            }
            HandlerKind::Email => {
                let notification = form.notification.as_ref().ok_or_else(|| {
                    FormsError::Configuration("email handler without a notification".to_string())
                })?;
                self.handlers.email.handle(notification, submission).await
            }
            // Handled in step 4, after feedback
            HandlerKind::Redirect => Ok(()),
        }
    }

    /// Stores each uploaded file and replaces the field's cleaned value
    /// with the stored path.
    async fn run_upload(
        &self,
        form: &FormConfig,
        submission: &mut Submission,
        outcome: &mut ProcessOutcome,
    ) -> FormsResult<()> {
        let policy = form.uploads.as_ref().ok_or_else(|| {
            FormsError::Configuration("upload handler without a policy".to_string())
        })?;

        let prefix = submission.id.simple().to_string();
        let files: Vec<(String, anvil_forms_http::UploadedFile)> = submission
            .files
            .iter()
            .map(|(field, file)| (field.clone(), file.clone()))
            .collect();

        for (field, file) in files {
            let path = self.handlers.upload.store(&file, policy, &prefix).await?;
            submission
                .cleaned
                .insert(field, Value::String(path.display().to_string()));
            outcome.stored_uploads.push(path);
        }
        Ok(())
    }
}
