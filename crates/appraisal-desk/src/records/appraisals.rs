use std::sync::Arc;

use serde_json::Value;

use super::domain::{Appraisal, AppraisalChanges};
use super::{RecordCollection, RecordError, APPRAISALS};
use crate::store::{DocumentStore, DocumentWrite, Query};

/// Access to the `appraisals` collection, keyed by business id.
pub struct AppraisalRecords<S: ?Sized> {
    collection: RecordCollection<S>,
}

impl<S> AppraisalRecords<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            collection: RecordCollection::new(store, APPRAISALS),
        }
    }

    /// Writes the appraisal under its own id (also stored as `appraisal_id`).
    /// Returns the id on success.
    pub async fn create(&self, appraisal: &Appraisal) -> Option<String> {
        if appraisal.id.is_empty() {
            tracing::error!("appraisal id is required to create an appraisal");
            return None;
        }

        let mut fields = self.collection.encode(appraisal)?;
        fields.remove("id");
        fields.insert(
            "appraisal_id".to_string(),
            Value::String(appraisal.id.clone()),
        );

        self.collection
            .create(Some(&appraisal.id), DocumentWrite::new(fields))
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Appraisal> {
        self.collection.get(id).await
    }

    /// Merges the set attributes of `changes` into the stored appraisal.
    pub async fn update(&self, id: &str, changes: &AppraisalChanges) -> bool {
        let Some(fields) = self.collection.encode(changes) else {
            return false;
        };
        self.collection.update(id, DocumentWrite::new(fields)).await
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.collection.delete(id).await
    }

    pub async fn get_all(&self) -> Vec<Appraisal> {
        self.collection.list(&Query::all()).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<Appraisal>, RecordError> {
        self.collection.fetch(&Query::all()).await
    }
}
