//! # anvil-forms-mail
//!
//! Mail queuing for anvil-forms. The request path never talks to an SMTP
//! server: the email handler serializes messages onto a durable file spool
//! ([`FileSpoolBackend`]), and a separate worker drains the spool through a
//! delivery backend ([`SmtpBackend`]) out of process. [`MemoryBackend`]
//! captures messages for tests.

pub mod backend;
pub mod message;
pub mod smtp;
pub mod spool;

pub use backend::{MailBackend, MemoryBackend};
pub use message::EmailMessage;
pub use smtp::SmtpBackend;
pub use spool::{flush_spool, FileSpoolBackend};
