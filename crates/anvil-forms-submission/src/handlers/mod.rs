//! Submission handlers.
//!
//! Each handler is a narrow adapter around one side effect. The full set is
//! constructed once per application by the registry and shared read-only;
//! handlers keep no per-submission state.

mod content;
mod database;
mod email;
mod redirect;
mod request;
mod upload;

pub use content::ContentHandler;
pub use database::DatabaseHandler;
pub use email::EmailHandler;
pub use redirect::RedirectHandler;
pub use request::RequestReader;
pub use upload::UploadHandler;

/// The fixed set of shared handler instances.
///
/// The stable registry keys (`content`, `database`, `email`, `redirect`,
/// `request`, `upload`) map to these fields; resolution is by field rather
/// than by string lookup, so a missing handler cannot happen at runtime.
pub struct HandlerSet {
    /// Creates typed content records.
    pub content: ContentHandler,
    /// Inserts database rows.
    pub database: DatabaseHandler,
    /// Queues notification email.
    pub email: EmailHandler,
    /// Resolves redirect targets to URLs.
    pub redirect: RedirectHandler,
    /// Reads submissions out of request bodies.
    pub request: RequestReader,
    /// Validates and stores uploaded files.
    pub upload: UploadHandler,
}
