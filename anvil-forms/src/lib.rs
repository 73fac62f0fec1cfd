//! # anvil-forms
//!
//! Configuration-driven form building and submission handling for the
//! Anvil CMS.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient
//! access. Depend on `anvil-forms` for the whole extension, or on the
//! individual crates for finer-grained control.
//!
//! ## Overview
//!
//! Forms are declared in configuration: fields with types and constraints,
//! dynamic choice lists (from content records, registered events, or static
//! lists), and the submission handlers that run after validation —
//! database, content record, email (file-spooled), redirect, and file
//! upload.
//!
//! ```no_run
//! use anvil_forms::config::FormsConfig;
//! use anvil_forms::core::Settings;
//! use anvil_forms::submission::{Registry, Submission};
//!
//! # async fn run() -> anvil_forms::core::FormsResult<()> {
//! let settings = Settings::from_toml_file("anvil-forms.toml")?;
//! let config = FormsConfig::from_toml_file("forms.toml")?;
//! let registry = Registry::builder(settings, config).build()?;
//!
//! let mut submission = Submission::new("contact")
//!     .with_value("name", "Alice")
//!     .with_value("email", "alice@example.com");
//! let outcome = registry.processor().process(&mut submission).await?;
//!
//! if let Some(_url) = outcome.redirect {
//!     // issue the redirect
//! }
//! # Ok(())
//! # }
//! ```

/// Core types: errors, feedback messages, settings, and logging.
pub use anvil_forms_core as core;

/// Choice specifications and resolvers.
#[cfg(feature = "choices")]
pub use anvil_forms_choices as choices;

/// Form and field configuration, field options, and constraints.
#[cfg(feature = "config")]
pub use anvil_forms_config as config;

/// Named-event dispatcher.
#[cfg(feature = "events")]
pub use anvil_forms_events as events;

/// Form data parsing, multipart uploads, and named routes.
#[cfg(feature = "http")]
pub use anvil_forms_http as http;

/// Mail message building, file spool, and delivery backends.
#[cfg(feature = "mail")]
pub use anvil_forms_mail as mail;

/// Content record storage abstraction.
#[cfg(feature = "storage")]
pub use anvil_forms_storage as storage;

/// Submission processing: handlers, processor, and registry.
#[cfg(feature = "submission")]
pub use anvil_forms_submission as submission;

/// Test helpers: mail outbox assertions and registry fixtures.
#[cfg(feature = "testing")]
pub use anvil_forms_test as test;
