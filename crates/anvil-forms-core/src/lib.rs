//! # anvil-forms-core
//!
//! Core types for the anvil-forms extension: the [`FormsError`] taxonomy,
//! the per-form [`feedback`](crate::feedback) message bag, extension-level
//! [`settings`](crate::settings), and logging setup.

pub mod error;
pub mod feedback;
pub mod logging;
pub mod settings;

pub use error::{FormsError, FormsResult, ValidationError};
pub use feedback::{Feedback, Message, MessageLevel};
pub use settings::Settings;
