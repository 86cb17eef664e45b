use std::sync::Arc;

use super::domain::{Location, LocationFields};
use super::{RecordCollection, RecordError, LOCATIONS};
use crate::store::{DocumentStore, DocumentWrite, Query};

/// Access to the `locations` collection; ids are generated by the store.
pub struct LocationRecords<S: ?Sized> {
    collection: RecordCollection<S>,
}

impl<S> LocationRecords<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            collection: RecordCollection::new(store, LOCATIONS),
        }
    }

    /// Returns the generated location id on success.
    pub async fn create(&self, fields: &LocationFields) -> Option<String> {
        let fields = self.collection.encode(fields)?;
        self.collection
            .create(None, DocumentWrite::new(fields))
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Location> {
        self.collection.get(id).await
    }

    pub async fn update(&self, id: &str, fields: &LocationFields) -> bool {
        let Some(fields) = self.collection.encode(fields) else {
            return false;
        };
        self.collection.update(id, DocumentWrite::new(fields)).await
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.collection.delete(id).await
    }

    pub async fn get_all(&self) -> Vec<Location> {
        self.collection.list(&Query::all()).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<Location>, RecordError> {
        self.collection.fetch(&Query::all()).await
    }

    /// Locations whose `property_name` matches exactly.
    pub async fn get_by_property_name(&self, property_name: &str) -> Vec<Location> {
        let query = Query::all().where_eq("property_name", property_name);
        self.collection.list(&query).await
    }
}
