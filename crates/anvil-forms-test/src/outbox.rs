//! Mail outbox assertions for tests.

use anvil_forms_mail::{EmailMessage, MemoryBackend};

/// Assertion helpers over a captured mail outbox.
///
/// Wraps the in-memory backend: hand the backend to the registry, keep the
/// outbox in the test, and assert on what was queued.
///
/// ## Example
///
/// ```
/// # tokio_test::block_on(async {
/// use anvil_forms_mail::{EmailMessage, MailBackend};
/// use anvil_forms_test::MailOutbox;
///
/// let outbox = MailOutbox::new();
/// outbox
///     .backend()
///     .send_message(&EmailMessage::new(
///         "Welcome",
///         "Hello!",
///         "noreply@example.com",
///         vec!["user@example.com".to_string()],
///     ))
///     .await
///     .unwrap();
///
/// outbox.assert_count(1);
/// outbox.assert_sent_to("user@example.com");
/// outbox.assert_subject_contains("Welcome");
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MailOutbox {
    backend: MemoryBackend,
}

impl MailOutbox {
    /// Creates a new empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the backend to wire into the registry.
    pub fn backend(&self) -> MemoryBackend {
        self.backend.clone()
    }

    /// Returns all captured messages.
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.backend.messages()
    }

    /// Returns the number of captured messages.
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Returns `true` if no messages were captured.
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Asserts that exactly `expected` messages were queued.
    ///
    /// # Panics
    ///
    /// Panics if the count does not match.
    pub fn assert_count(&self, expected: usize) {
        let actual = self.len();
        assert_eq!(
            actual, expected,
            "Expected {expected} email(s), but {actual} were queued"
        );
    }

    /// Asserts that a message was addressed to the given recipient,
    /// checking `to`, `cc`, and `bcc`.
    ///
    /// # Panics
    ///
    /// Panics if no message was addressed to the recipient.
    pub fn assert_sent_to(&self, address: &str) {
        let messages = self.messages();
        let found = messages.iter().any(|m| {
            m.to.iter().any(|a| a == address)
                || m.cc.iter().any(|a| a == address)
                || m.bcc.iter().any(|a| a == address)
        });
        assert!(
            found,
            "No email was sent to '{address}'. Recipients: {:?}",
            messages
                .iter()
                .flat_map(|m| m.to.iter().chain(m.cc.iter()).chain(m.bcc.iter()))
                .collect::<Vec<_>>()
        );
    }

    /// Asserts that a message subject contains the given substring.
    ///
    /// # Panics
    ///
    /// Panics if no subject matches.
    pub fn assert_subject_contains(&self, substring: &str) {
        let messages = self.messages();
        let found = messages.iter().any(|m| m.subject.contains(substring));
        assert!(
            found,
            "No email with subject containing '{substring}'. Subjects: {:?}",
            messages.iter().map(|m| &m.subject).collect::<Vec<_>>()
        );
    }

    /// Asserts that a message body contains the given substring.
    ///
    /// # Panics
    ///
    /// Panics if no body matches.
    pub fn assert_body_contains(&self, substring: &str) {
        let found = self.messages().iter().any(|m| m.body.contains(substring));
        assert!(found, "No email body contains '{substring}'");
    }
}
