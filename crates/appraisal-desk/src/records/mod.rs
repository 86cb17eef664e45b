//! Record access layer: one typed wrapper per document collection.
//!
//! Every public operation on the wrappers is non-failing. Store errors are
//! logged and folded into `None`, `false`, or an empty `Vec`, so callers see a
//! missing record, a backend outage, and an empty collection the same way.
//! The `fetch_all` variants are the one exception and report failures.

pub mod appraisals;
pub mod domain;
pub mod location_ref;
pub mod locations;
pub mod logs;
pub mod utilities;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::store::{DocumentStore, DocumentWrite, Fields, Query, StoreError};

pub use appraisals::AppraisalRecords;
pub use domain::{
    Appraisal, AppraisalChanges, AppraisalDraft, AppraisalLog, Location, LocationFields,
    LogEntryChanges, LogEntryDraft, UtilityItem, UtilityItemChanges, UtilityItemDraft,
    UtilityItemType,
};
pub use location_ref::LocationRef;
pub use locations::LocationRecords;
pub use logs::LogRecords;
pub use utilities::UtilityRecords;

pub const APPRAISALS: &str = "appraisals";
pub const LOCATIONS: &str = "locations";
pub const REPORT_UTILITIES: &str = "report_utilities";
pub const APPRAISAL_LOGS: &str = "appraisal_logs";

/// Error enumeration for the fallible listing path.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("record must encode to a field map")]
    NotAMap,
}

/// Serializes a typed record into top-level document fields.
pub(crate) fn to_fields<T: Serialize>(record: &T) -> Result<Fields, RecordError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(RecordError::NotAMap),
    }
}

/// Untyped operations over one collection, shared by the typed wrappers.
pub(crate) struct RecordCollection<S: ?Sized> {
    store: Arc<S>,
    name: &'static str,
}

impl<S> RecordCollection<S>
where
    S: DocumentStore + ?Sized,
{
    pub(crate) fn new(store: Arc<S>, name: &'static str) -> Self {
        Self { store, name }
    }

    pub(crate) async fn create(&self, id: Option<&str>, write: DocumentWrite) -> Option<String> {
        if id.is_some_and(str::is_empty) {
            error!(
                collection = self.name,
                "refusing to create a document with an empty id"
            );
            return None;
        }

        match self.store.insert(self.name, id, write).await {
            Ok(id) => {
                debug!(collection = self.name, %id, "document created");
                Some(id)
            }
            Err(err) => {
                error!(collection = self.name, error = %err, "failed to create document");
                None
            }
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, id: &str) -> Option<T> {
        if id.is_empty() {
            error!(collection = self.name, "document id is required for lookup");
            return None;
        }

        match self.store.get(self.name, id).await {
            Ok(Some(document)) => match serde_json::from_value(document.into_value()) {
                Ok(record) => Some(record),
                Err(err) => {
                    error!(
                        collection = self.name,
                        %id,
                        error = %err,
                        "failed to decode document"
                    );
                    None
                }
            },
            Ok(None) => {
                debug!(collection = self.name, %id, "no such document");
                None
            }
            Err(err) => {
                error!(
                    collection = self.name,
                    %id,
                    error = %err,
                    "failed to fetch document"
                );
                None
            }
        }
    }

    pub(crate) async fn update(&self, id: &str, write: DocumentWrite) -> bool {
        if id.is_empty() {
            error!(collection = self.name, "document id is required for update");
            return false;
        }

        match self.store.update(self.name, id, write).await {
            Ok(()) => {
                debug!(collection = self.name, %id, "document updated");
                true
            }
            Err(err) => {
                error!(
                    collection = self.name,
                    %id,
                    error = %err,
                    "failed to update document"
                );
                false
            }
        }
    }

    pub(crate) async fn delete(&self, id: &str) -> bool {
        if id.is_empty() {
            error!(collection = self.name, "document id is required for delete");
            return false;
        }

        match self.store.delete(self.name, id).await {
            Ok(()) => {
                debug!(collection = self.name, %id, "document deleted");
                true
            }
            Err(err) => {
                error!(
                    collection = self.name,
                    %id,
                    error = %err,
                    "failed to delete document"
                );
                false
            }
        }
    }

    /// Runs a query and decodes each hit; undecodable documents are skipped.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        query: &Query,
    ) -> Result<Vec<T>, RecordError> {
        let documents = self.store.query(self.name, query).await?;
        let records = documents
            .into_iter()
            .filter_map(|document| {
                let id = document.id.clone();
                match serde_json::from_value(document.into_value()) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        warn!(
                            collection = self.name,
                            %id,
                            error = %err,
                            "skipping malformed document"
                        );
                        None
                    }
                }
            })
            .collect();
        Ok(records)
    }

    /// Non-failing form of [`Self::fetch`].
    pub(crate) async fn list<T: DeserializeOwned>(&self, query: &Query) -> Vec<T> {
        match self.fetch(query).await {
            Ok(records) => records,
            Err(err) => {
                error!(collection = self.name, error = %err, "failed to query collection");
                Vec::new()
            }
        }
    }

    /// Encodes a typed record, logging instead of failing.
    pub(crate) fn encode<T: Serialize>(&self, record: &T) -> Option<Fields> {
        match to_fields(record) {
            Ok(fields) => Some(fields),
            Err(err) => {
                error!(collection = self.name, error = %err, "failed to encode record");
                None
            }
        }
    }
}
