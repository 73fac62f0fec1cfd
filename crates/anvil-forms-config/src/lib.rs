//! # anvil-forms-config
//!
//! Per-form configuration for anvil-forms. [`FormsConfig`] is the parsed
//! view of the host's form declarations: for each named form, an ordered
//! list of fields, the declared submission handlers, and the targets those
//! handlers act on. [`FieldOptions`] turns one field's configuration into
//! the finalized options a renderer and the validation step consume,
//! resolving dynamic choices and constraint declarations exactly once.

pub mod constraints;
pub mod fields;
pub mod form;
pub mod options;

pub use constraints::{constraint_rule, ConstraintOptions, ConstraintRule};
pub use fields::{clean_value, FieldType};
pub use form::{
    ContentTarget, DatabaseTarget, FeedbackMessages, FieldConfig, FormConfig, FormsConfig,
    HandlerKind, NotificationConfig, RedirectTarget, UploadPolicy,
};
pub use options::{FieldOptions, ResolvedOptions};
