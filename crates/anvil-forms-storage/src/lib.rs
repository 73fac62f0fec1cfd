//! # anvil-forms-storage
//!
//! Storage abstraction for anvil-forms. The host CMS owns the real content
//! store; this crate defines the [`Value`] type submissions are expressed in,
//! the [`ContentRecord`] shape for typed records, and the [`ContentStorage`]
//! trait the handlers talk to. [`MemoryStorage`] ships for tests and
//! development.

pub mod record;
pub mod value;

pub use record::{ContentRecord, ContentStorage, MemoryStorage, Row};
pub use value::Value;
