//! Document-store seam shared by every record collection.
//!
//! Collections hold schema-less JSON documents addressed by collection name and
//! document id. Two backends implement [`DocumentStore`]: an in-process map used
//! for development and tests, and the Firestore REST API.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use firestore::FirestoreDocumentStore;
pub use memory::MemoryDocumentStore;

/// Top-level fields of a stored document.
pub type Fields = Map<String, Value>;

/// A fetched document: its id plus the stored fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Fields merged with the document id under `id`, ready for typed decoding.
    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Value::Object(fields)
    }
}

/// Payload for insert/update calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    pub fields: Fields,
    /// Field names the store stamps with its own request time.
    pub server_timestamps: Vec<String>,
}

impl DocumentWrite {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    pub fn with_server_timestamp(mut self, field: &str) -> Self {
        self.server_timestamps.push(field.to_string());
        self
    }

    /// Every field path the write touches, timestamps included.
    pub fn field_paths(&self) -> Vec<String> {
        self.fields
            .keys()
            .cloned()
            .chain(self.server_timestamps.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Collection query; the default value lists the whole collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }
}

/// Error enumeration for document-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("document store unavailable: {0}")]
    Backend(String),
    #[error("malformed document: {0}")]
    Decode(String),
}

/// Storage abstraction so the record layer can run against any backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes a new document. `Some(id)` creates or overwrites that document;
    /// `None` asks the store to generate an id. Returns the document id.
    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        write: DocumentWrite,
    ) -> Result<String, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merges the supplied fields into an existing document.
    async fn update(&self, collection: &str, id: &str, write: DocumentWrite)
        -> Result<(), StoreError>;

    /// Removes a document; deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;
}

const GENERATED_ID_LEN: usize = 20;

/// Random 20-character alphanumeric id, the shape Firestore auto-ids take.
pub fn generate_document_id() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect()
}
