//! Registry wiring.
//!
//! [`Registry`] is the extension's service wiring: it constructs the shared
//! handler set and processor once from settings, configuration, and the
//! host collaborators, and hands out read-only references afterwards. Pure
//! wiring, no logic.

use std::sync::Arc;

use tracing::debug;

use anvil_forms_config::FormsConfig;
use anvil_forms_core::{Feedback, FormsResult, Settings};
use anvil_forms_events::EventDispatcher;
use anvil_forms_http::RouteTable;
use anvil_forms_mail::{FileSpoolBackend, MailBackend};
use anvil_forms_storage::{ContentStorage, MemoryStorage};

use crate::handlers::{
    ContentHandler, DatabaseHandler, EmailHandler, HandlerSet, RedirectHandler, RequestReader,
    UploadHandler,
};
use crate::processor::Processor;

/// The wired-up extension services.
///
/// Constructed once per application via [`Registry::builder`]; everything
/// it hands out is shared and read-only.
pub struct Registry {
    settings: Settings,
    config: Arc<FormsConfig>,
    storage: Arc<dyn ContentStorage>,
    events: Arc<EventDispatcher>,
    mailer: Arc<dyn MailBackend>,
    routes: Arc<RouteTable>,
    feedback: Feedback,
    handlers: Arc<HandlerSet>,
    processor: Arc<Processor>,
}

impl Registry {
    /// Starts building a registry from settings and form configuration.
    pub fn builder(settings: Settings, config: FormsConfig) -> RegistryBuilder {
        RegistryBuilder {
            settings,
            config,
            storage: None,
            events: None,
            mailer: None,
            routes: None,
        }
    }

    /// The extension settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The parsed form declarations.
    pub fn config(&self) -> &FormsConfig {
        &self.config
    }

    /// The content storage collaborator.
    pub fn storage(&self) -> &Arc<dyn ContentStorage> {
        &self.storage
    }

    /// The event dispatcher.
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// The mail backend submissions queue onto.
    pub fn mailer(&self) -> &Arc<dyn MailBackend> {
        &self.mailer
    }

    /// The host's named routes.
    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// The per-form feedback bag.
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// The shared handler set.
    pub fn handlers(&self) -> &Arc<HandlerSet> {
        &self.handlers
    }

    /// The submission processor.
    pub fn processor(&self) -> &Arc<Processor> {
        &self.processor
    }
}

/// Builder for [`Registry`].
///
/// Collaborators not supplied fall back to development defaults: in-memory
/// storage, a fresh event dispatcher, the file spool from settings, and an
/// empty route table.
pub struct RegistryBuilder {
    settings: Settings,
    config: FormsConfig,
    storage: Option<Arc<dyn ContentStorage>>,
    events: Option<Arc<EventDispatcher>>,
    mailer: Option<Arc<dyn MailBackend>>,
    routes: Option<RouteTable>,
}

impl RegistryBuilder {
    /// Supplies the host's content storage.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn ContentStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Supplies the host's event dispatcher.
    #[must_use]
    pub fn events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Supplies the mail backend (the file spool from settings otherwise).
    #[must_use]
    pub fn mailer(mut self, mailer: Arc<dyn MailBackend>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Supplies the host's named routes.
    #[must_use]
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Wires everything up.
    ///
    /// # Errors
    ///
    /// Fails when the spool directory cannot be created or the template
    /// directory holds broken templates.
    pub fn build(self) -> FormsResult<Registry> {
        let settings = self.settings;
        let config = Arc::new(self.config);

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let events = self.events.unwrap_or_else(|| Arc::new(EventDispatcher::new()));
        let mailer = match self.mailer {
            Some(mailer) => mailer,
            None => Arc::new(FileSpoolBackend::new(&settings.spool_dir)?),
        };
        let routes = Arc::new(self.routes.unwrap_or_default());
        let feedback = Feedback::new();
        let templates = Arc::new(load_templates(&settings)?);

        let handlers = Arc::new(HandlerSet {
            content: ContentHandler::new(Arc::clone(&storage)),
            database: DatabaseHandler::new(Arc::clone(&storage)),
            email: EmailHandler::new(
                Arc::clone(&mailer),
                templates,
                settings.from_email.clone(),
            ),
            redirect: RedirectHandler::new(Arc::clone(&routes)),
            request: RequestReader::new(),
            upload: UploadHandler::new(&settings.upload_dir),
        });

        let processor = Arc::new(Processor::new(
            Arc::clone(&config),
            Arc::clone(&storage),
            Arc::clone(&events),
            feedback.clone(),
            Arc::clone(&handlers),
        ));

        debug!(
            forms = ?config.form_names(),
            spool = %settings.spool_dir.display(),
            "anvil-forms registry wired"
        );

        Ok(Registry {
            settings,
            config,
            storage,
            events,
            mailer,
            routes,
            feedback,
            handlers,
            processor,
        })
    }
}

/// Loads the email body templates from the configured directory, or an
/// empty set when the directory does not exist.
fn load_templates(settings: &Settings) -> FormsResult<tera::Tera> {
    if settings.templates_dir.is_dir() {
        let glob = format!("{}/**/*", settings.templates_dir.display());
        tera::Tera::new(&glob).map_err(|e| {
            anvil_forms_core::FormsError::Template(format!(
                "Failed to load templates from '{}': {e}",
                settings.templates_dir.display()
            ))
        })
    } else {
        Ok(tera::Tera::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::Submission;

    const CONFIG: &str = r#"
        [forms.contact]
        handlers = ["database"]

        [forms.contact.database]
        table = "contact_entries"

        [[forms.contact.fields]]
        name = "name"
        type = "text"
    "#;

    fn settings(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.spool_dir = dir.join("spool");
        settings.upload_dir = dir.join("uploads");
        settings.templates_dir = dir.join("templates");
        settings
    }

    #[tokio::test]
    async fn test_build_with_defaults_and_process() {
        let dir = tempfile::tempdir().unwrap();
        let config = FormsConfig::from_toml_str(CONFIG).unwrap();
        let registry = Registry::builder(settings(dir.path()), config)
            .build()
            .unwrap();

        let mut submission = Submission::new("contact").with_value("name", "Alice");
        let outcome = registry.processor().process(&mut submission).await.unwrap();

        assert!(outcome.succeeded());
        assert_eq!(registry.feedback().len("contact"), 1);
        // The default mailer is the file spool under settings.spool_dir
        assert!(dir.path().join("spool").is_dir());
    }

    #[test]
    fn test_build_creates_spool_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = FormsConfig::from_toml_str(CONFIG).unwrap();
        Registry::builder(settings(dir.path()), config).build().unwrap();
        assert!(dir.path().join("spool").is_dir());
    }

    #[test]
    fn test_templates_loaded_when_dir_exists() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("notify.txt"), "Hello {{ form }}").unwrap();

        let config = FormsConfig::from_toml_str(CONFIG).unwrap();
        let registry = Registry::builder(settings(dir.path()), config)
            .build()
            .unwrap();
        // Wiring succeeded with a populated template set
        assert!(registry.config().get("contact").is_some());
    }
}
