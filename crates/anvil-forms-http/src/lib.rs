//! # anvil-forms-http
//!
//! Request-side plumbing for anvil-forms: the [`FormData`] multi-value
//! dictionary for url-encoded bodies, multipart parsing for file uploads,
//! and the [`RouteTable`] used to reverse named routes into redirect URLs.
//!
//! The host CMS owns the actual HTTP server; these types only describe the
//! slice of a request a form submission needs.

pub mod formdata;
pub mod multipart;
pub mod routes;

pub use formdata::FormData;
pub use multipart::{parse_multipart, MultipartData, UploadedFile, DEFAULT_MAX_FILE_SIZE};
pub use routes::RouteTable;
