use std::sync::Arc;

use super::domain::{UtilityItem, UtilityItemChanges, UtilityItemDraft, UtilityItemType};
use super::{RecordCollection, RecordError, REPORT_UTILITIES};
use crate::store::{DocumentStore, DocumentWrite, Query};

const LAST_UPDATED: &str = "last_updated";

/// Access to the `report_utilities` collection, keyed by caller-chosen ids.
/// Every write stamps `last_updated` with the store's clock.
pub struct UtilityRecords<S: ?Sized> {
    collection: RecordCollection<S>,
}

impl<S> UtilityRecords<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            collection: RecordCollection::new(store, REPORT_UTILITIES),
        }
    }

    pub async fn create(&self, id: &str, draft: &UtilityItemDraft) -> bool {
        if id.is_empty() {
            tracing::error!("utility item id is required to create a utility item");
            return false;
        }
        let Some(fields) = self.collection.encode(draft) else {
            return false;
        };
        let write = DocumentWrite::new(fields).with_server_timestamp(LAST_UPDATED);
        self.collection.create(Some(id), write).await.is_some()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<UtilityItem> {
        self.collection.get(id).await
    }

    pub async fn update(&self, id: &str, changes: &UtilityItemChanges) -> bool {
        let Some(fields) = self.collection.encode(changes) else {
            return false;
        };
        let write = DocumentWrite::new(fields).with_server_timestamp(LAST_UPDATED);
        self.collection.update(id, write).await
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.collection.delete(id).await
    }

    pub async fn get_all(&self) -> Vec<UtilityItem> {
        self.collection.list(&Query::all()).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<UtilityItem>, RecordError> {
        self.collection.fetch(&Query::all()).await
    }

    pub async fn get_by_type(&self, item_type: UtilityItemType) -> Vec<UtilityItem> {
        let query = Query::all().where_eq("type", item_type.as_str());
        self.collection.list(&query).await
    }

    pub async fn get_by_category(&self, category: &str) -> Vec<UtilityItem> {
        let query = Query::all().where_eq("category", category);
        self.collection.list(&query).await
    }
}
