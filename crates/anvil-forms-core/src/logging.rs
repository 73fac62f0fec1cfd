//! Logging setup for the anvil-forms extension.
//!
//! Provides a [`tracing`]-based subscriber configured from
//! [`Settings`](crate::settings::Settings).

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`. In debug mode a pretty,
/// human-readable format is used; otherwise a structured JSON format.
/// Installing a subscriber twice is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one submission's processing pipeline.
///
/// # Examples
///
/// ```
/// use anvil_forms_core::logging::submission_span;
///
/// let span = submission_span("contact", "9f0c6ee2");
/// let _guard = span.enter();
/// tracing::info!("processing submission");
/// ```
pub fn submission_span(form: &str, submission_id: &str) -> tracing::Span {
    tracing::info_span!("submission", form = form, id = submission_id)
}
