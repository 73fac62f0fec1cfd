//! Content records and the storage trait.
//!
//! A [`ContentRecord`] is a typed, storage-backed structured record managed
//! by the host CMS (a "page", an "entry", a "pet"). The [`ContentStorage`]
//! trait is the seam between anvil-forms and the host's persistence layer:
//! choice resolution reads records through it, and the content/database
//! handlers write through it.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use anvil_forms_core::{FormsError, FormsResult};

use crate::value::Value;

/// A generic database row: column name to value.
pub type Row = BTreeMap<String, Value>;

/// A typed content record: a content-type name plus its field values.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContentRecord {
    /// The content-type this record belongs to (e.g. "pages").
    pub content_type: String,
    /// Field values, keyed by attribute name.
    pub fields: BTreeMap<String, Value>,
}

impl ContentRecord {
    /// Creates a new record of the given content type with no fields.
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Creates a record of the given content type with the given fields.
    pub fn with_fields(content_type: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        Self {
            content_type: content_type.into(),
            fields,
        }
    }

    /// Returns the value of the named attribute, if present.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.fields.get(attribute)
    }

    /// Sets an attribute value, replacing any existing one.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(attribute.into(), value.into());
        self
    }
}

/// The persistence seam between anvil-forms and the host CMS.
///
/// The host supplies the real implementation over its content model and
/// database. All operations are async; the extension never blocks a request
/// thread on storage.
#[async_trait]
pub trait ContentStorage: Send + Sync {
    /// Fetches all records of the named content type.
    async fn fetch_all(&self, content_type: &str) -> FormsResult<Vec<ContentRecord>>;

    /// Creates a new typed content record.
    async fn create_record(&self, record: ContentRecord) -> FormsResult<()>;

    /// Inserts one row into the named database table.
    async fn insert_row(&self, table: &str, row: Row) -> FormsResult<()>;
}

/// An in-memory [`ContentStorage`] for tests and development.
///
/// Records and rows are held behind `RwLock`s; reads clone, writes append.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<BTreeMap<String, Vec<ContentRecord>>>,
    rows: RwLock<BTreeMap<String, Vec<Row>>>,
}

impl MemoryStorage {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record, for arranging test fixtures.
    pub fn seed_record(&self, record: ContentRecord) {
        self.records
            .write()
            .expect("storage lock poisoned")
            .entry(record.content_type.clone())
            .or_default()
            .push(record);
    }

    /// Returns all rows inserted into the named table.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.rows
            .read()
            .expect("storage lock poisoned")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns all records of the named content type.
    pub fn records(&self, content_type: &str) -> Vec<ContentRecord> {
        self.records
            .read()
            .expect("storage lock poisoned")
            .get(content_type)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContentStorage for MemoryStorage {
    async fn fetch_all(&self, content_type: &str) -> FormsResult<Vec<ContentRecord>> {
        Ok(self.records(content_type))
    }

    async fn create_record(&self, record: ContentRecord) -> FormsResult<()> {
        if record.content_type.is_empty() {
            return Err(FormsError::Storage(
                "Cannot create a record without a content type".to_string(),
            ));
        }
        self.seed_record(record);
        Ok(())
    }

    async fn insert_row(&self, table: &str, row: Row) -> FormsResult<()> {
        if table.is_empty() {
            return Err(FormsError::Storage(
                "Cannot insert a row without a table name".to_string(),
            ));
        }
        self.rows
            .write()
            .expect("storage lock poisoned")
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(())
    }
}
