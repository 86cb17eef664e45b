use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::{
    generate_document_id, Direction, Document, DocumentStore, DocumentWrite, Fields, Query,
    StoreError,
};

type Collection = BTreeMap<String, Fields>;

/// In-process document store. Documents within a collection list in id order,
/// mirroring the remote store's default ordering.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|guard| guard.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn poisoned<T>(_: T) -> StoreError {
        StoreError::Backend("memory store lock poisoned".to_string())
    }
}

fn server_now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn stamp(write: DocumentWrite) -> Fields {
    let DocumentWrite {
        mut fields,
        server_timestamps,
    } = write;
    for field in server_timestamps {
        fields.insert(field, server_now());
    }
    fields
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn matches(fields: &Fields, query: &Query) -> bool {
    query
        .filters
        .iter()
        .all(|filter| fields.get(&filter.field) == Some(&filter.value))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        write: DocumentWrite,
    ) -> Result<String, StoreError> {
        let mut guard = self.collections.write().map_err(Self::poisoned)?;
        let documents = guard.entry(collection.to_string()).or_default();

        let id = match id {
            Some(id) => id.to_string(),
            None => loop {
                let candidate = generate_document_id();
                if !documents.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        documents.insert(id.clone(), stamp(write));
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.read().map_err(Self::poisoned)?;
        Ok(guard
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        let mut guard = self.collections.write().map_err(Self::poisoned)?;
        let existing = guard
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or(StoreError::NotFound)?;

        existing.extend(stamp(write));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.write().map_err(Self::poisoned)?;
        if let Some(documents) = guard.get_mut(collection) {
            documents.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read().map_err(Self::poisoned)?;
        let Some(documents) = guard.get(collection) else {
            return Ok(Vec::new());
        };

        let mut selected: Vec<Document> = documents
            .iter()
            .filter(|(_, fields)| matches(fields, query))
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            // Ordering on a field drops documents that lack it.
            selected.retain(|document| document.fields.contains_key(field));
            selected.sort_by(|a, b| {
                let ordering = compare_values(&a.fields[field], &b.fields[field]);
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Ok(selected)
    }
}
