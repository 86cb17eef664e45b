use std::sync::Arc;

use super::domain::{AppraisalLog, LogEntryChanges, LogEntryDraft};
use super::{RecordCollection, RecordError, APPRAISAL_LOGS};
use crate::store::{Direction, DocumentStore, DocumentWrite, Query};

const TIMESTAMP: &str = "timestamp";

/// Access to the append-only `appraisal_logs` collection. Listings are newest first.
pub struct LogRecords<S: ?Sized> {
    collection: RecordCollection<S>,
}

impl<S> LogRecords<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            collection: RecordCollection::new(store, APPRAISAL_LOGS),
        }
    }

    /// Appends an entry stamped with the store's clock; returns its generated id.
    pub async fn create(&self, entry: &LogEntryDraft) -> Option<String> {
        let fields = self.collection.encode(entry)?;
        let write = DocumentWrite::new(fields).with_server_timestamp(TIMESTAMP);
        self.collection.create(None, write).await
    }

    pub async fn get_by_id(&self, id: &str) -> Option<AppraisalLog> {
        self.collection.get(id).await
    }

    pub async fn update(&self, id: &str, changes: &LogEntryChanges) -> bool {
        let Some(fields) = self.collection.encode(changes) else {
            return false;
        };
        self.collection.update(id, DocumentWrite::new(fields)).await
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.collection.delete(id).await
    }

    pub async fn get_all(&self) -> Vec<AppraisalLog> {
        self.collection.list(&newest_first()).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<AppraisalLog>, RecordError> {
        self.collection.fetch(&newest_first()).await
    }

    pub async fn get_by_appraisal_id(&self, appraisal_id: &str) -> Vec<AppraisalLog> {
        let query = Query::all()
            .where_eq("appraisal_id", appraisal_id)
            .order_by(TIMESTAMP, Direction::Descending);
        let logs = self.collection.list(&query).await;
        tracing::debug!(appraisal_id, count = logs.len(), "fetched appraisal logs");
        logs
    }
}

fn newest_first() -> Query {
    Query::all().order_by(TIMESTAMP, Direction::Descending)
}
