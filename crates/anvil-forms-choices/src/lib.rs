//! # anvil-forms-choices
//!
//! Choice resolution for anvil-forms. A "choice" field's valid values come
//! from one of three sources: a concrete list in configuration, the records
//! of a content type, or the event names registered on the dispatcher. The
//! source is selected by the `choices` entry of the field configuration —
//! either an inline list or a [`ChoiceSpec`] string — and resolved into a
//! [`ChoiceSet`] by a [`ChoiceResolver`].

pub mod resolver;
pub mod set;
pub mod spec;

pub use resolver::{
    resolver_for, ChoiceResolver, ChoiceSource, ContentResolver, EventResolver, StaticResolver,
};
pub use set::{Choice, ChoiceParams, ChoiceSet};
pub use spec::ChoiceSpec;
