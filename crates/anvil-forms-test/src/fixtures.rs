//! Registry fixtures.
//!
//! [`TestRegistry`] wires a fully in-memory registry around temporary
//! directories: in-memory storage and outbox, a temp spool and upload dir,
//! and handles to everything a test wants to assert on.

use std::sync::Arc;

use anvil_forms_config::FormsConfig;
use anvil_forms_core::Settings;
use anvil_forms_events::EventDispatcher;
use anvil_forms_http::RouteTable;
use anvil_forms_storage::MemoryStorage;
use anvil_forms_submission::Registry;

use crate::outbox::MailOutbox;

/// A registry wired for tests, with handles to its collaborators.
pub struct TestRegistry {
    /// The wired registry.
    pub registry: Registry,
    /// The in-memory storage behind the content/database handlers.
    pub storage: Arc<MemoryStorage>,
    /// The event dispatcher.
    pub events: Arc<EventDispatcher>,
    /// The captured mail outbox.
    pub outbox: MailOutbox,
    /// Root of the temporary spool/upload/template directories.
    pub dir: tempfile::TempDir,
}

impl TestRegistry {
    /// Builds a test registry from a TOML form declaration.
    ///
    /// # Panics
    ///
    /// Panics on invalid configuration; fixtures are for tests.
    pub fn from_toml(forms_toml: &str) -> Self {
        Self::with_routes(forms_toml, RouteTable::new())
    }

    /// Builds a test registry with named routes for redirect tests.
    ///
    /// # Panics
    ///
    /// Panics on invalid configuration; fixtures are for tests.
    pub fn with_routes(forms_toml: &str, routes: RouteTable) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");

        let mut settings = Settings::default();
        settings.spool_dir = dir.path().join("spool");
        settings.upload_dir = dir.path().join("uploads");
        settings.templates_dir = dir.path().join("templates");
        settings.from_email = "forms@example.com".to_string();

        let config = FormsConfig::from_toml_str(forms_toml).expect("valid forms config");
        let storage = Arc::new(MemoryStorage::new());
        let events = Arc::new(EventDispatcher::new());
        let outbox = MailOutbox::new();

        let registry = Registry::builder(settings, config)
            .storage(Arc::clone(&storage) as _)
            .events(Arc::clone(&events))
            .mailer(Arc::new(outbox.backend()))
            .routes(routes)
            .build()
            .expect("wire test registry");

        Self {
            registry,
            storage,
            events,
            outbox,
            dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_forms_submission::Submission;

    #[tokio::test]
    async fn test_fixture_round_trip() {
        let t = TestRegistry::from_toml(
            r#"
            [forms.contact]
            handlers = ["email"]

            [forms.contact.notification]
            to = ["owner@example.com"]

            [[forms.contact.fields]]
            name = "name"
            type = "text"
            "#,
        );

        let mut submission = Submission::new("contact").with_value("name", "Alice");
        let outcome = t
            .registry
            .processor()
            .process(&mut submission)
            .await
            .unwrap();

        assert!(outcome.succeeded());
        t.outbox.assert_count(1);
        t.outbox.assert_sent_to("owner@example.com");
    }
}
