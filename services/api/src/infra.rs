use appraisal_desk::config::StoreConfig;
use appraisal_desk::store::{DocumentStore, FirestoreDocumentStore, MemoryDocumentStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the configured document store behind a trait object so the router
/// is built once for either backend.
pub(crate) fn build_store(config: &StoreConfig) -> Arc<dyn DocumentStore> {
    match config {
        StoreConfig::Memory => {
            info!("using in-memory document store");
            Arc::new(MemoryDocumentStore::new())
        }
        StoreConfig::Firestore(firestore) => {
            info!(
                project_id = %firestore.project_id,
                database = %firestore.database,
                "using Firestore document store"
            );
            Arc::new(FirestoreDocumentStore::new(firestore))
        }
    }
}
