use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tokio::sync::Notify;

use crate::desk::{appraisal_router, AppraisalDesk, DeskState};
use crate::records::{AppraisalDraft, LocationFields};
use crate::store::{
    Document, DocumentStore, DocumentWrite, MemoryDocumentStore, Query, StoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Op {
    Insert,
    Get,
    Update,
    Delete,
    Query,
}

/// In-memory store that fails selected (collection, operation) pairs.
#[derive(Default, Clone)]
pub(super) struct FlakyStore {
    pub(super) inner: MemoryDocumentStore,
    failures: Arc<Mutex<HashSet<(String, Op)>>>,
}

impl FlakyStore {
    pub(super) fn fail(&self, collection: &str, op: Op) {
        self.failures
            .lock()
            .expect("failure set poisoned")
            .insert((collection.to_string(), op));
    }

    pub(super) fn recover(&self) {
        self.failures.lock().expect("failure set poisoned").clear();
    }

    fn check(&self, collection: &str, op: Op) -> Result<(), StoreError> {
        let failing = self
            .failures
            .lock()
            .expect("failure set poisoned")
            .contains(&(collection.to_string(), op));
        if failing {
            return Err(StoreError::Backend("database offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        write: DocumentWrite,
    ) -> Result<String, StoreError> {
        self.check(collection, Op::Insert)?;
        self.inner.insert(collection, id, write).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check(collection, Op::Get)?;
        self.inner.get(collection, id).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        self.check(collection, Op::Update)?;
        self.inner.update(collection, id, write).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check(collection, Op::Delete)?;
        self.inner.delete(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.check(collection, Op::Query)?;
        self.inner.query(collection, query).await
    }
}

/// In-memory store whose reads park until the gate is released.
#[derive(Default)]
pub(super) struct GatedStore {
    pub(super) inner: MemoryDocumentStore,
    held: AtomicBool,
    gate: Notify,
}

impl GatedStore {
    pub(super) fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub(super) fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.gate.notify_waiters();
    }

    async fn pass(&self) {
        loop {
            let opened = self.gate.notified();
            if !self.held.load(Ordering::SeqCst) {
                return;
            }
            opened.await;
        }
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        write: DocumentWrite,
    ) -> Result<String, StoreError> {
        self.inner.insert(collection, id, write).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.pass().await;
        self.inner.get(collection, id).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        self.inner.update(collection, id, write).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.pass().await;
        self.inner.query(collection, query).await
    }
}

/// Yields to spawned operations until `ready` holds for the desk state.
pub(super) async fn wait_for_state<S, F>(desk: &AppraisalDesk<S>, ready: F) -> DeskState
where
    S: DocumentStore + ?Sized,
    F: Fn(&DeskState) -> bool,
{
    for _ in 0..1_000 {
        let state = desk.snapshot();
        if ready(&state) {
            return state;
        }
        tokio::task::yield_now().await;
    }
    panic!("desk never reached the expected state: {:?}", desk.snapshot());
}

pub(super) fn build_desk() -> (AppraisalDesk<FlakyStore>, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::default());
    (AppraisalDesk::new(store.clone()), store)
}

pub(super) fn desk_router() -> (Router, Arc<AppraisalDesk<FlakyStore>>, Arc<FlakyStore>) {
    let (desk, store) = build_desk();
    let desk = Arc::new(desk);
    (appraisal_router(desk.clone()), desk, store)
}

pub(super) fn acme_draft() -> AppraisalDraft {
    AppraisalDraft {
        client_name: "Acme".to_string(),
        property_address: "1 Main St".to_string(),
        status: "data_entry".to_string(),
        report_type: "Full".to_string(),
        ..AppraisalDraft::default()
    }
}

pub(super) fn metro_location() -> LocationFields {
    LocationFields {
        address_line1: Some("1 Main St".to_string()),
        city: Some("Metro".to_string()),
        state: Some("GA".to_string()),
        zip_code: Some("30303".to_string()),
        county: Some("Fulton".to_string()),
        property_type: Some("Commercial".to_string()),
        ..LocationFields::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
