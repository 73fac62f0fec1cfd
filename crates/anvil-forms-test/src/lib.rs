//! # anvil-forms-test
//!
//! Test helpers for anvil-forms: the [`MailOutbox`] wrapper with assertion
//! helpers over the in-memory mail backend, and [`TestRegistry`] fixtures
//! wiring a fully in-memory registry around temporary directories.

pub mod fixtures;
pub mod outbox;

pub use fixtures::TestRegistry;
pub use outbox::MailOutbox;
