//! Choice resolvers.
//!
//! [`resolver_for`] inspects a field's choice source and returns the
//! matching resolver: a pass-through over inline configuration, a content
//! resolver reading records from storage, or an event resolver enumerating
//! dispatcher registrations. Resolution is async because the content
//! resolver hits storage.

use std::sync::Arc;

use async_trait::async_trait;

use anvil_forms_core::FormsResult;
use anvil_forms_events::EventDispatcher;
use anvil_forms_storage::ContentStorage;

use crate::set::{Choice, ChoiceParams, ChoiceSet};
use crate::spec::ChoiceSpec;

/// Where a field's choices come from, as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceSource {
    /// An already-concrete list of `(value, label)` entries.
    Inline(Vec<(String, String)>),
    /// A specification string to parse (`content::...`, `event`, or a
    /// static value).
    Spec(String),
}

/// Resolves one field's choice source into a [`ChoiceSet`].
#[async_trait]
pub trait ChoiceResolver: Send + Sync {
    /// The field this resolver serves.
    fn name(&self) -> &str;

    /// Builds the choice set.
    async fn resolve(&self) -> FormsResult<ChoiceSet>;
}

/// Returns the resolver matching the given choice source.
///
/// A non-spec string source wraps into the static resolver as a single
/// entry, mirroring how concrete configuration values pass through
/// untouched.
///
/// # Errors
///
/// Returns a configuration error for malformed `content::` specifications.
pub fn resolver_for(
    form_name: &str,
    field_name: &str,
    source: ChoiceSource,
    params: ChoiceParams,
    storage: Arc<dyn ContentStorage>,
    events: Arc<EventDispatcher>,
) -> FormsResult<Box<dyn ChoiceResolver>> {
    match source {
        ChoiceSource::Inline(entries) => Ok(Box::new(StaticResolver::new(
            form_name, field_name, entries, params,
        ))),
        ChoiceSource::Spec(raw) => match ChoiceSpec::parse(&raw)? {
            ChoiceSpec::Content {
                content_type,
                value_field,
                label_field,
                legacy: _,
            } => Ok(Box::new(ContentResolver {
                form_name: form_name.to_string(),
                field_name: field_name.to_string(),
                content_type,
                value_field,
                label_field,
                params,
                storage,
            })),
            ChoiceSpec::Event { filter } => Ok(Box::new(EventResolver {
                form_name: form_name.to_string(),
                field_name: field_name.to_string(),
                filter,
                params,
                events,
            })),
            ChoiceSpec::Static => Ok(Box::new(StaticResolver::new(
                form_name,
                field_name,
                vec![(raw.clone(), raw)],
                params,
            ))),
        },
    }
}

/// Pass-through resolver over concrete configuration entries.
pub struct StaticResolver {
    form_name: String,
    field_name: String,
    entries: Vec<(String, String)>,
    params: ChoiceParams,
}

impl StaticResolver {
    /// Creates a static resolver over `(value, label)` entries.
    pub fn new(
        form_name: impl Into<String>,
        field_name: impl Into<String>,
        entries: Vec<(String, String)>,
        params: ChoiceParams,
    ) -> Self {
        Self {
            form_name: form_name.into(),
            field_name: field_name.into(),
            entries,
            params,
        }
    }
}

#[async_trait]
impl ChoiceResolver for StaticResolver {
    fn name(&self) -> &str {
        &self.field_name
    }

    async fn resolve(&self) -> FormsResult<ChoiceSet> {
        let mut set = ChoiceSet::new(&self.field_name);
        set.choices = self
            .entries
            .iter()
            .map(|(value, label)| Choice::new(value, label))
            .collect();
        set.apply_params(&self.params);

        tracing::debug!(
            form = %self.form_name,
            field = %self.field_name,
            count = set.len(),
            "resolved static choices"
        );
        Ok(set)
    }
}

/// Resolver reading choices from the records of a content type.
pub struct ContentResolver {
    form_name: String,
    field_name: String,
    content_type: String,
    value_field: String,
    label_field: String,
    params: ChoiceParams,
    storage: Arc<dyn ContentStorage>,
}

#[async_trait]
impl ChoiceResolver for ContentResolver {
    fn name(&self) -> &str {
        &self.field_name
    }

    async fn resolve(&self) -> FormsResult<ChoiceSet> {
        let mut records = self.storage.fetch_all(&self.content_type).await?;

        // A record-attribute sort key sorts the records before mapping;
        // "label"/"value" sorts are applied on the mapped set below.
        if let Some(sort) = &self.params.sort {
            if sort != "label" && sort != "value" {
                records.sort_by_key(|r| r.get(sort).map(ToString::to_string).unwrap_or_default());
            }
        }

        let mut set = ChoiceSet::new(&self.field_name);
        set.value_field = Some(self.value_field.clone());
        set.label_field = Some(self.label_field.clone());
        set.choices = records
            .iter()
            .filter_map(|record| {
                let value = record.get(&self.value_field)?;
                let label = record.get(&self.label_field)?;
                Some(Choice::new(value.to_string(), label.to_string()))
            })
            .collect();
        set.apply_params(&self.params);

        tracing::debug!(
            form = %self.form_name,
            field = %self.field_name,
            content_type = %self.content_type,
            count = set.len(),
            "resolved content choices"
        );
        Ok(set)
    }
}

/// Resolver enumerating the event names registered on the dispatcher.
pub struct EventResolver {
    form_name: String,
    field_name: String,
    filter: Option<String>,
    params: ChoiceParams,
    events: Arc<EventDispatcher>,
}

#[async_trait]
impl ChoiceResolver for EventResolver {
    fn name(&self) -> &str {
        &self.field_name
    }

    async fn resolve(&self) -> FormsResult<ChoiceSet> {
        let mut set = ChoiceSet::new(&self.field_name);
        set.choices = self
            .events
            .event_names()
            .into_iter()
            .filter(|name| {
                self.filter
                    .as_ref()
                    .map_or(true, |prefix| name.starts_with(prefix.as_str()))
            })
            .map(|name| Choice::new(name.clone(), name))
            .collect();
        set.apply_params(&self.params);

        tracing::debug!(
            form = %self.form_name,
            field = %self.field_name,
            count = set.len(),
            "resolved event choices"
        );
        Ok(set)
    }
}
