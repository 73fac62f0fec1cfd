//! # anvil-forms-submission
//!
//! Submission handling for anvil-forms. A [`Submission`] is one visitor's
//! set of submitted values; the [`Processor`] runs it through the fixed
//! pipeline — validate fields, dispatch to the form's declared handlers,
//! emit feedback, produce a redirect — and the [`Registry`] wires the
//! shared handler instances to their collaborators once per application.

pub mod handlers;
pub mod processor;
pub mod registry;
pub mod submission;

pub use handlers::{
    ContentHandler, DatabaseHandler, EmailHandler, HandlerSet, RedirectHandler, RequestReader,
    UploadHandler,
};
pub use processor::{ProcessOutcome, Processor};
pub use registry::{Registry, RegistryBuilder};
pub use submission::Submission;
