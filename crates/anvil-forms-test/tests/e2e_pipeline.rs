//! End-to-end pipeline tests: request body in, side effects out.

use std::sync::Arc;

use anvil_forms_config::FormsConfig;
use anvil_forms_core::{MessageLevel, Settings};
use anvil_forms_http::RouteTable;
use anvil_forms_mail::{flush_spool, MemoryBackend};
use anvil_forms_storage::{ContentRecord, Value};
use anvil_forms_submission::{Registry, RequestReader, Submission};
use anvil_forms_test::TestRegistry;

const CONTACT: &str = r#"
    [forms.contact]
    handlers = ["database", "email", "redirect"]

    [forms.contact.database]
    table = "contact_entries"

    [forms.contact.notification]
    to = ["owner@example.com"]
    subject = "New message from {{ fields.name }}"
    reply_to = "email"

    [forms.contact.redirect]
    route = "page"
    params = { slug = "thank-you" }

    [[forms.contact.fields]]
    name = "name"
    type = "text"
    constraints = ["not_blank", { length = { min = 2, max = 50 } }]

    [[forms.contact.fields]]
    name = "email"
    type = "email"
    constraints = "email"

    [[forms.contact.fields]]
    name = "message"
    type = "textarea"
    required = false
"#;

fn contact_registry() -> TestRegistry {
    let mut routes = RouteTable::new();
    routes.add("page", "/pages/<slug>/");
    TestRegistry::with_routes(CONTACT, routes)
}

#[tokio::test]
async fn test_full_pipeline_from_request_body() {
    let t = contact_registry();
    let reader = RequestReader::new();

    let body = "name=Alice&email=alice%40example.com&message=Hello+there";
    let mut submission = reader.read_urlencoded("contact", body);

    let outcome = t
        .registry
        .processor()
        .process(&mut submission)
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(outcome.redirect.as_deref(), Some("/pages/thank-you/"));

    // Exactly one stored row
    let rows = t.storage.rows("contact_entries");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("Alice")));
    assert_eq!(rows[0].get("message"), Some(&Value::from("Hello there")));

    // Exactly one queued email, reply-to taken from the submitted field
    t.outbox.assert_count(1);
    t.outbox.assert_sent_to("owner@example.com");
    t.outbox.assert_subject_contains("Alice");
    let message = t.outbox.messages().pop().unwrap();
    assert_eq!(message.reply_to.as_deref(), Some("alice@example.com"));

    // Success feedback waiting for the next render
    let messages = t.registry.feedback().drain("contact");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].level, MessageLevel::Success);
}

#[tokio::test]
async fn test_invalid_submission_has_no_side_effects() {
    let t = contact_registry();
    let reader = RequestReader::new();

    let mut submission = reader.read_urlencoded("contact", "name=A&email=broken");
    let outcome = t
        .registry
        .processor()
        .process(&mut submission)
        .await
        .unwrap();

    assert!(!outcome.is_valid());
    assert!(outcome.errors.contains_key("name"));
    assert!(outcome.errors.contains_key("email"));
    assert!(outcome.redirect.is_none());

    assert!(t.storage.rows("contact_entries").is_empty());
    t.outbox.assert_count(0);

    let messages = t.registry.feedback().drain("contact");
    assert_eq!(messages[0].level, MessageLevel::Error);
}

#[tokio::test]
async fn test_content_choices_validate_membership() {
    let t = TestRegistry::from_toml(
        r#"
        [forms.adopt]
        handlers = ["content"]

        [forms.adopt.content]
        content_type = "adoptions"

        [[forms.adopt.fields]]
        name = "pet"
        type = "choice"
        choices = "content::pets::slug::title"
        "#,
    );

    let mut koala = ContentRecord::new("pets");
    koala.set("title", "Koala").set("slug", "gum-tree");
    t.storage.seed_record(koala);

    // A value from the content-derived set passes
    let mut submission = Submission::new("adopt").with_value("pet", "gum-tree");
    let outcome = t
        .registry
        .processor()
        .process(&mut submission)
        .await
        .unwrap();
    assert!(outcome.succeeded());
    assert_eq!(t.storage.records("adoptions").len(), 1);

    // A value outside the set is a field error, not a stored record
    let mut submission = Submission::new("adopt").with_value("pet", "kennel");
    let outcome = t
        .registry
        .processor()
        .process(&mut submission)
        .await
        .unwrap();
    assert!(!outcome.is_valid());
    assert!(outcome.errors.get("pet").unwrap()[0].contains("valid choice"));
    assert_eq!(t.storage.records("adoptions").len(), 1);
}

#[tokio::test]
async fn test_event_choices_from_dispatcher() {
    let t = TestRegistry::from_toml(
        r#"
        [forms.hooks]
        handlers = ["database"]

        [forms.hooks.database]
        table = "hook_subscriptions"

        [[forms.hooks.fields]]
        name = "hook"
        type = "choice"
        choices = "event"
        "#,
    );
    t.events.register("form.submitted");
    t.events.register("content.saved");

    let mut submission = Submission::new("hooks").with_value("hook", "content.saved");
    let outcome = t
        .registry
        .processor()
        .process(&mut submission)
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert_eq!(t.storage.rows("hook_subscriptions").len(), 1);
}

#[tokio::test]
async fn test_multipart_upload_pipeline() {
    let t = TestRegistry::from_toml(
        r#"
        [forms.jobs]
        handlers = ["upload", "database"]

        [forms.jobs.database]
        table = "applications"

        [forms.jobs.uploads]
        max_size = 1024
        allowed_extensions = ["pdf"]

        [[forms.jobs.fields]]
        name = "name"
        type = "text"

        [[forms.jobs.fields]]
        name = "cv"
        type = "file"
        required = false
        "#,
    );

    let boundary = "b123";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"name\"\r\n\
         \r\n\
         Alice\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"cv\"; filename=\"cv.pdf\"\r\n\
         Content-Type: application/pdf\r\n\
         \r\n\
         PDF data\r\n\
         --{boundary}--\r\n"
    );

    let reader = RequestReader::new();
    let mut submission = reader
        .read(
            "jobs",
            body.as_bytes(),
            &format!("multipart/form-data; boundary={boundary}"),
        )
        .unwrap();

    let outcome = t
        .registry
        .processor()
        .process(&mut submission)
        .await
        .unwrap();

    assert!(outcome.succeeded(), "{:?}", outcome.handler_failures);
    assert_eq!(outcome.stored_uploads.len(), 1);
    let stored = &outcome.stored_uploads[0];
    assert!(stored.starts_with(t.dir.path().join("uploads")));
    assert_eq!(std::fs::read(stored).unwrap(), b"PDF data");

    // The database row references the stored path
    let rows = t.storage.rows("applications");
    assert!(rows[0].get("cv").unwrap().to_string().ends_with(".pdf"));
}

#[tokio::test]
async fn test_default_mailer_spools_to_disk_and_flushes() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.spool_dir = dir.path().join("spool");
    settings.upload_dir = dir.path().join("uploads");
    settings.templates_dir = dir.path().join("templates");
    settings.from_email = "forms@example.com".to_string();

    let config = FormsConfig::from_toml_str(
        r#"
        [forms.contact]
        handlers = ["email"]

        [forms.contact.notification]
        to = ["owner@example.com"]

        [[forms.contact.fields]]
        name = "name"
        type = "text"
        "#,
    )
    .unwrap();

    let registry = Registry::builder(settings, config).build().unwrap();

    let mut submission = Submission::new("contact").with_value("name", "Alice");
    let outcome = registry.processor().process(&mut submission).await.unwrap();
    assert!(outcome.succeeded());

    // The request path only queued the message durably
    let spool_files: Vec<_> = std::fs::read_dir(dir.path().join("spool"))
        .unwrap()
        .collect();
    assert_eq!(spool_files.len(), 1);

    // The delivery worker drains the spool
    let delivery = MemoryBackend::new();
    let delivered = flush_spool(dir.path().join("spool"), &delivery).await.unwrap();
    assert_eq!(delivered, 1);
    assert_eq!(delivery.messages()[0].to, vec!["owner@example.com"]);
    assert!(std::fs::read_dir(dir.path().join("spool")).unwrap().next().is_none());
}

#[tokio::test]
async fn test_feedback_is_drained_once() {
    let t = contact_registry();
    let reader = RequestReader::new();

    let mut submission =
        reader.read_urlencoded("contact", "name=Alice&email=alice%40example.com");
    t.registry
        .processor()
        .process(&mut submission)
        .await
        .unwrap();

    assert_eq!(t.registry.feedback().drain("contact").len(), 1);
    assert!(t.registry.feedback().drain("contact").is_empty());
}

#[tokio::test]
async fn test_two_submissions_two_rows_two_emails() {
    let t = contact_registry();
    let reader = RequestReader::new();

    for name in ["Alice", "Bob"] {
        let mut submission = reader.read_urlencoded(
            "contact",
            &format!("name={name}&email={}@example.com", name.to_lowercase()),
        );
        let outcome = t
            .registry
            .processor()
            .process(&mut submission)
            .await
            .unwrap();
        assert!(outcome.succeeded());
    }

    assert_eq!(t.storage.rows("contact_entries").len(), 2);
    t.outbox.assert_count(2);
}
