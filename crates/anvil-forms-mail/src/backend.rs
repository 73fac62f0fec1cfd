//! Mail backend trait and the in-memory capture backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use anvil_forms_core::FormsResult;

use crate::message::EmailMessage;

/// A destination for outgoing email.
///
/// The request path uses the file spool backend; the delivery worker uses
/// SMTP; tests use the in-memory backend. All backends report a
/// backend-specific message id on success.
#[async_trait]
pub trait MailBackend: Send + Sync {
    /// Accepts one message, returning a backend-specific message id.
    async fn send_message(&self, message: &EmailMessage) -> FormsResult<String>;
}

/// An in-memory backend that captures messages instead of sending them.
///
/// Cloning shares the captured list, so a test can keep one handle while the
/// registry holds another.
///
/// # Examples
///
/// ```
/// # tokio_test::block_on(async {
/// use anvil_forms_mail::{EmailMessage, MailBackend, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// backend
///     .send_message(&EmailMessage::new("Hi", "Hello", "a@b.com", vec!["c@d.com".into()]))
///     .await
///     .unwrap();
/// assert_eq!(backend.messages().len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    messages: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MemoryBackend {
    /// Creates a new empty capture backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured messages.
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.messages
            .lock()
            .expect("mail backend lock poisoned")
            .clone()
    }

    /// Returns the number of captured messages.
    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .expect("mail backend lock poisoned")
            .len()
    }

    /// Returns `true` if no messages have been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all captured messages.
    pub fn clear(&self) {
        self.messages
            .lock()
            .expect("mail backend lock poisoned")
            .clear();
    }

    /// Returns the most recently captured message, if any.
    pub fn last_message(&self) -> Option<EmailMessage> {
        self.messages
            .lock()
            .expect("mail backend lock poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl MailBackend for MemoryBackend {
    async fn send_message(&self, message: &EmailMessage) -> FormsResult<String> {
        let mut messages = self.messages.lock().expect("mail backend lock poisoned");
        messages.push(message.clone());
        Ok(format!("memory-{}", messages.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EmailMessage {
        EmailMessage::new(
            "Subject",
            "Body",
            "sender@example.com",
            vec!["recipient@example.com".to_string()],
        )
    }

    #[tokio::test]
    async fn test_capture() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());

        let id = backend.send_message(&sample()).await.unwrap();
        assert_eq!(id, "memory-1");
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.messages()[0].subject, "Subject");
    }

    #[tokio::test]
    async fn test_last_and_clear() {
        let backend = MemoryBackend::new();
        backend.send_message(&sample()).await.unwrap();

        let mut second = sample();
        second.subject = "Second".to_string();
        backend.send_message(&second).await.unwrap();

        assert_eq!(backend.last_message().unwrap().subject, "Second");
        backend.clear();
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let backend = MemoryBackend::new();
        let other = backend.clone();
        backend.send_message(&sample()).await.unwrap();
        assert_eq!(other.len(), 1);
    }
}
