//! Finalized field options.
//!
//! [`FieldOptions`] is the derived, memoized view over one field's
//! configuration: resolved choices for `choice`-typed fields and
//! constraint declarations normalized into constructed rules. Resolution
//! runs once, on first access, and the result is cached for the object's
//! lifetime; choice resolution never re-runs for the same options object.

use std::sync::Arc;

use tokio::sync::OnceCell;

use anvil_forms_choices::{resolver_for, ChoiceSet, ChoiceSource};
use anvil_forms_core::FormsResult;
use anvil_forms_events::EventDispatcher;
use anvil_forms_storage::{ContentStorage, Value};

use crate::constraints::{constraint_rule, ConstraintRule};
use crate::fields::FieldType;
use crate::form::FieldConfig;

/// The finalized options for one field.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    /// The field type.
    pub field_type: FieldType,
    /// Whether the field must be filled in.
    pub required: bool,
    /// The options mapping handed to a form renderer. For `choice` fields
    /// the resolved choice entries replace the raw `choices` value and the
    /// resolver-specific `params` entry is dropped.
    pub base: serde_json::Map<String, serde_json::Value>,
    /// The resolved choice set, for `choice`-typed fields.
    pub choices: Option<ChoiceSet>,
    /// Constructed constraint rules, in declaration order.
    pub constraints: Vec<(String, ConstraintRule)>,
}

impl ResolvedOptions {
    /// Validates a cleaned value against this field's rules.
    ///
    /// Checks choice membership first (a submitted value must be part of
    /// the resolved set), then every declared constraint. All failures are
    /// collected; nothing short-circuits.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(choices) = &self.choices {
            let member = |s: &str| choices.contains_value(s);
            let valid = match value {
                Value::Null => true,
                Value::String(s) => member(s),
                Value::List(items) => items
                    .iter()
                    .all(|item| item.as_str().is_some_and(member)),
                other => member(&other.to_string()),
            };
            if !valid {
                errors.push(format!(
                    "Select a valid choice. {value} is not one of the available choices."
                ));
            }
        }

        for (_, rule) in &self.constraints {
            if let Err(e) = rule.validate(value) {
                errors.push(e.to_string());
            }
        }

        errors
    }
}

/// Lazily built, memoized options for one field of one form.
pub struct FieldOptions {
    form_name: String,
    config: FieldConfig,
    storage: Arc<dyn ContentStorage>,
    events: Arc<EventDispatcher>,
    resolved: OnceCell<ResolvedOptions>,
}

impl FieldOptions {
    /// Creates the options view for a field, wiring in the collaborators
    /// dynamic choice resolution needs.
    pub fn new(
        form_name: impl Into<String>,
        config: FieldConfig,
        storage: Arc<dyn ContentStorage>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            form_name: form_name.into(),
            config,
            storage,
            events,
            resolved: OnceCell::new(),
        }
    }

    /// The field's name.
    pub fn field_name(&self) -> &str {
        &self.config.name
    }

    /// The field's declared configuration.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Returns the finalized options, resolving them on first access.
    ///
    /// Idempotent: subsequent calls return the cached result without
    /// re-resolving choices or rebuilding constraints.
    pub async fn options(&self) -> FormsResult<&ResolvedOptions> {
        self.resolved.get_or_try_init(|| self.build()).await
    }

    async fn build(&self) -> FormsResult<ResolvedOptions> {
        let mut base = base_options(&self.config);

        let choices = if self.config.field_type == FieldType::Choice {
            let source = self
                .config
                .choices
                .as_ref()
                .map_or_else(|| ChoiceSource::Inline(Vec::new()), |c| c.to_source());

            let resolver = resolver_for(
                &self.form_name,
                &self.config.name,
                source,
                self.config.params.clone(),
                Arc::clone(&self.storage),
                Arc::clone(&self.events),
            )?;
            let set = resolver.resolve().await?;

            merge_choice_options(&mut base, &set);
            Some(set)
        } else {
            None
        };

        let mut constraints = Vec::new();
        if let Some(entry) = &self.config.constraints {
            for (name, options) in entry.declarations() {
                let rule = constraint_rule(&self.form_name, &name, &options)?;
                constraints.push((name, rule));
            }
        }

        Ok(ResolvedOptions {
            field_type: self.config.field_type,
            required: self.config.required,
            base,
            choices,
            constraints,
        })
    }
}

/// Builds the base options mapping from the field's configuration.
fn base_options(config: &FieldConfig) -> serde_json::Map<String, serde_json::Value> {
    let mut base = serde_json::Map::new();
    base.insert("type".to_string(), config.field_type.as_str().into());
    base.insert("required".to_string(), config.required.into());

    if let Some(label) = &config.label {
        base.insert("label".to_string(), label.clone().into());
    }
    if let Some(placeholder) = &config.placeholder {
        base.insert("placeholder".to_string(), placeholder.clone().into());
    }
    if let Some(help) = &config.help {
        base.insert("help".to_string(), help.clone().into());
    }
    if let Some(initial) = &config.initial {
        base.insert("initial".to_string(), initial.clone().into());
    }
    if !config.attr.is_empty() {
        base.insert(
            "attr".to_string(),
            serde_json::to_value(&config.attr).unwrap_or_default(),
        );
    }
    if config.params != anvil_forms_choices::ChoiceParams::default() {
        base.insert(
            "params".to_string(),
            serde_json::to_value(&config.params).unwrap_or_default(),
        );
    }
    if let Some(choices) = &config.choices {
        base.insert(
            "choices".to_string(),
            serde_json::to_value(choices).unwrap_or_default(),
        );
    }

    base
}

/// Replaces the raw choice configuration with the resolved set and drops
/// the resolver-specific `params` entry from the final output.
fn merge_choice_options(base: &mut serde_json::Map<String, serde_json::Value>, set: &ChoiceSet) {
    base.remove("params");

    let entries: Vec<serde_json::Value> = set
        .choices
        .iter()
        .map(|c| serde_json::json!({"value": c.value, "label": c.label}))
        .collect();
    base.insert("choices".to_string(), entries.into());

    if let Some(value_field) = &set.value_field {
        base.insert("choice_value".to_string(), value_field.clone().into());
    }
    if let Some(label_field) = &set.label_field {
        base.insert("choice_label".to_string(), label_field.clone().into());
    }
    if let Some(group_by) = &set.group_by {
        base.insert("group_by".to_string(), group_by.clone().into());
    }
    if !set.preferred.is_empty() {
        base.insert(
            "preferred_choices".to_string(),
            serde_json::to_value(&set.preferred).unwrap_or_default(),
        );
    }
    if !set.attr.is_empty() {
        base.insert(
            "choice_attr".to_string(),
            serde_json::to_value(&set.attr).unwrap_or_default(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{ChoicesEntry, ConstraintsEntry, FormsConfig};
    use anvil_forms_core::FormsError;
    use anvil_forms_storage::{ContentRecord, MemoryStorage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn collaborators() -> (Arc<MemoryStorage>, Arc<EventDispatcher>) {
        (Arc::new(MemoryStorage::new()), Arc::new(EventDispatcher::new()))
    }

    /// Storage wrapper counting `fetch_all` calls.
    struct CountingStorage {
        inner: MemoryStorage,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl ContentStorage for CountingStorage {
        async fn fetch_all(&self, content_type: &str) -> FormsResult<Vec<ContentRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_all(content_type).await
        }

        async fn create_record(&self, record: ContentRecord) -> FormsResult<()> {
            self.inner.create_record(record).await
        }

        async fn insert_row(
            &self,
            table: &str,
            row: anvil_forms_storage::Row,
        ) -> FormsResult<()> {
            self.inner.insert_row(table, row).await
        }
    }

    fn pet_field() -> FieldConfig {
        let mut config = FieldConfig::new("pet", FieldType::Choice);
        config.choices = Some(ChoicesEntry::Spec("content::pets::slug::title".to_string()));
        config
    }

    #[tokio::test]
    async fn test_non_choice_base_matches_configuration() {
        let (storage, events) = collaborators();
        let mut config = FieldConfig::new("name", FieldType::Text);
        config.label = Some("Your name".to_string());
        config.placeholder = Some("Jane Doe".to_string());

        let options = FieldOptions::new("contact", config, storage, events);
        let resolved = options.options().await.unwrap();

        assert_eq!(resolved.base.get("type").unwrap(), "text");
        assert_eq!(resolved.base.get("label").unwrap(), "Your name");
        assert_eq!(resolved.base.get("placeholder").unwrap(), "Jane Doe");
        assert_eq!(resolved.base.get("required").unwrap(), true);
        assert!(resolved.choices.is_none());
        assert!(resolved.constraints.is_empty());
    }

    #[tokio::test]
    async fn test_choice_field_merges_resolved_choices_and_drops_params() {
        let storage = MemoryStorage::new();
        let mut record = ContentRecord::new("pets");
        record.set("title", "Koala").set("slug", "gum-tree");
        storage.seed_record(record);

        let mut config = pet_field();
        config.params.sort = Some("title".to_string());

        let options = FieldOptions::new(
            "contact",
            config,
            Arc::new(storage),
            Arc::new(EventDispatcher::new()),
        );
        let resolved = options.options().await.unwrap();

        // Resolver params never reach the final output
        assert!(!resolved.base.contains_key("params"));

        let choices = resolved.base.get("choices").unwrap().as_array().unwrap();
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0]["value"], "gum-tree");
        assert_eq!(choices[0]["label"], "Koala");
        assert_eq!(resolved.base.get("choice_value").unwrap(), "slug");
        assert_eq!(resolved.base.get("choice_label").unwrap(), "title");

        let set = resolved.choices.as_ref().unwrap();
        assert_eq!(set.label_for("gum-tree"), Some("Koala"));
    }

    #[tokio::test]
    async fn test_options_resolve_once() {
        let storage = Arc::new(CountingStorage {
            inner: MemoryStorage::new(),
            fetches: AtomicUsize::new(0),
        });

        let options = FieldOptions::new(
            "contact",
            pet_field(),
            Arc::clone(&storage) as Arc<dyn ContentStorage>,
            Arc::new(EventDispatcher::new()),
        );

        let first = options.options().await.unwrap().base.clone();
        let second = options.options().await.unwrap().base.clone();

        assert_eq!(first, second);
        assert_eq!(storage.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_spec_fails_at_resolution() {
        let (storage, events) = collaborators();
        let mut config = FieldConfig::new("pet", FieldType::Choice);
        config.choices = Some(ChoicesEntry::Spec("content::pets".to_string()));

        let options = FieldOptions::new("contact", config, storage, events);
        let result = options.options().await;
        assert!(matches!(result, Err(FormsError::InvalidChoiceSpec(_))));
    }

    #[tokio::test]
    async fn test_constraint_string_and_list_normalize_alike() {
        let (storage, events) = collaborators();

        let mut single = FieldConfig::new("email", FieldType::Email);
        single.constraints = Some(ConstraintsEntry::Single("email".to_string()));
        let single = FieldOptions::new("contact", single, Arc::clone(&storage) as _, Arc::clone(&events));
        let single = single.options().await.unwrap();

        assert_eq!(single.constraints.len(), 1);
        assert_eq!(single.constraints[0].0, "email");
        assert!(matches!(single.constraints[0].1, ConstraintRule::Email { .. }));
    }

    #[tokio::test]
    async fn test_unknown_constraint_fails_at_resolution() {
        let (storage, events) = collaborators();
        let mut config = FieldConfig::new("name", FieldType::Text);
        config.constraints = Some(ConstraintsEntry::Single("sparkles".to_string()));

        let options = FieldOptions::new("contact", config, storage, events);
        let result = options.options().await;
        assert!(matches!(result, Err(FormsError::UnknownConstraint { .. })));
    }

    #[tokio::test]
    async fn test_validate_choice_membership() {
        let storage = MemoryStorage::new();
        let mut record = ContentRecord::new("pets");
        record.set("title", "Koala").set("slug", "gum-tree");
        storage.seed_record(record);

        let options = FieldOptions::new(
            "contact",
            pet_field(),
            Arc::new(storage),
            Arc::new(EventDispatcher::new()),
        );
        let resolved = options.options().await.unwrap();

        assert!(resolved.validate(&Value::from("gum-tree")).is_empty());
        let errors = resolved.validate(&Value::from("burrow"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("valid choice"));
        // Empty optional choice fields pass membership
        assert!(resolved.validate(&Value::Null).is_empty());
    }

    #[tokio::test]
    async fn test_validate_collects_all_constraint_errors() {
        let (storage, events) = collaborators();
        let config = FormsConfig::from_toml_str(
            r#"
            [[forms.contact.fields]]
            name = "code"
            type = "text"
            constraints = [
                { length = { min = 6 } },
                { regex = { pattern = "^[A-Z]+$" } },
            ]
            "#,
        )
        .unwrap();
        let field = config.get("contact").unwrap().fields[0].clone();

        let options = FieldOptions::new("contact", field, storage, events);
        let resolved = options.options().await.unwrap();

        let errors = resolved.validate(&Value::from("abc"));
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn test_inline_list_choices() {
        let (storage, events) = collaborators();
        let mut config = FieldConfig::new("color", FieldType::Choice);
        config.choices = Some(ChoicesEntry::List(vec![
            "red".to_string(),
            "blue".to_string(),
        ]));

        let options = FieldOptions::new("contact", config, storage, events);
        let resolved = options.options().await.unwrap();
        let set = resolved.choices.as_ref().unwrap();
        assert_eq!(set.values(), vec!["red", "blue"]);
        // Static sets carry no content attribute metadata
        assert!(!resolved.base.contains_key("choice_value"));
    }
}
