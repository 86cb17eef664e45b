use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use tracing::{error, info, warn};

use super::state::{Activity, AppraisalDetail, DeskState, StatePatch};
use crate::records::{
    Appraisal, AppraisalChanges, AppraisalDraft, AppraisalRecords, Location, LocationFields,
    LocationRecords, LocationRef, LogRecords, UtilityItem, UtilityRecords,
};
use crate::store::DocumentStore;

/// Shared orchestration layer: composes record access calls and keeps the
/// cached collections, flags, and last error that the HTTP surface renders.
///
/// Operations may run concurrently; they only lock the state between store
/// calls, so racing operations overwrite `current` and `error` last-write-wins.
pub struct AppraisalDesk<S: ?Sized> {
    appraisals: AppraisalRecords<S>,
    locations: LocationRecords<S>,
    utilities: UtilityRecords<S>,
    logs: LogRecords<S>,
    state: Mutex<DeskState>,
}

/// Business id for a new appraisal. Two creations within the same
/// millisecond receive the same id.
fn new_appraisal_id() -> String {
    format!("A-{}", Utc::now().timestamp_millis())
}

impl<S> AppraisalDesk<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            appraisals: AppraisalRecords::new(store.clone()),
            locations: LocationRecords::new(store.clone()),
            utilities: UtilityRecords::new(store.clone()),
            logs: LogRecords::new(store),
            state: Mutex::new(DeskState::default()),
        }
    }

    pub fn appraisals(&self) -> &AppraisalRecords<S> {
        &self.appraisals
    }

    pub fn locations(&self) -> &LocationRecords<S> {
        &self.locations
    }

    pub fn utilities(&self) -> &UtilityRecords<S> {
        &self.utilities
    }

    pub fn logs(&self) -> &LogRecords<S> {
        &self.logs
    }

    pub fn snapshot(&self) -> DeskState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .error
            .clone()
    }

    pub fn clear_error(&self) {
        self.apply([StatePatch::ClearError]);
    }

    fn apply<I>(&self, patches: I)
    where
        I: IntoIterator<Item = StatePatch>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for patch in patches {
            state.apply(patch);
        }
    }

    /// Reloads the full appraisal list. A backend failure leaves an empty list
    /// and an error message; nothing is returned as an error.
    pub async fn fetch_all_appraisals(&self) -> Vec<Appraisal> {
        self.apply([
            StatePatch::Begin(Activity::LoadingAppraisals),
            StatePatch::ClearError,
        ]);

        let appraisals = match self.appraisals.fetch_all().await {
            Ok(appraisals) => {
                self.apply([StatePatch::Appraisals(appraisals.clone())]);
                appraisals
            }
            Err(err) => {
                error!(error = %err, "failed to fetch appraisals");
                self.apply([
                    StatePatch::Fail(format!("Failed to fetch appraisals: {err}")),
                    StatePatch::Appraisals(Vec::new()),
                ]);
                Vec::new()
            }
        };

        self.apply([StatePatch::Finish(Activity::LoadingAppraisals)]);
        appraisals
    }

    /// Loads an appraisal and, when its location reference is well formed, the
    /// referenced location. A malformed reference yields no location and no error.
    pub async fn fetch_appraisal_with_location(&self, appraisal_id: &str) -> AppraisalDetail {
        if appraisal_id.is_empty() {
            warn!("fetch_appraisal_with_location called without an appraisal id");
            self.apply([
                StatePatch::Current(AppraisalDetail::default()),
                StatePatch::Fail("No appraisal ID provided to fetch details.".to_string()),
                StatePatch::Finish(Activity::LoadingCurrent),
            ]);
            return AppraisalDetail::default();
        }

        self.apply([
            StatePatch::Begin(Activity::LoadingCurrent),
            StatePatch::ClearError,
        ]);

        let detail = match self.appraisals.get_by_id(appraisal_id).await {
            Some(appraisal) => {
                let location = self.resolve_location(&appraisal).await;
                let detail = AppraisalDetail {
                    appraisal: Some(appraisal),
                    location,
                };
                self.apply([StatePatch::Current(detail.clone())]);
                detail
            }
            None => {
                self.apply([
                    StatePatch::Current(AppraisalDetail::default()),
                    StatePatch::Fail(format!("Appraisal with ID {appraisal_id} not found.")),
                ]);
                AppraisalDetail::default()
            }
        };

        self.apply([StatePatch::Finish(Activity::LoadingCurrent)]);
        detail
    }

    async fn resolve_location(&self, appraisal: &Appraisal) -> Option<Location> {
        let raw = appraisal.location_ref.as_deref()?;
        match LocationRef::parse(raw) {
            Some(reference) => self.locations.get_by_id(reference.id()).await,
            None => {
                warn!(
                    appraisal_id = %appraisal.id,
                    location_ref = raw,
                    "invalid location reference; skipping location lookup"
                );
                None
            }
        }
    }

    pub async fn fetch_all_utility_items(&self) -> Vec<UtilityItem> {
        self.apply([
            StatePatch::Begin(Activity::LoadingUtilityItems),
            StatePatch::ClearError,
        ]);

        let items = match self.utilities.fetch_all().await {
            Ok(items) => {
                self.apply([StatePatch::UtilityItems(items.clone())]);
                items
            }
            Err(err) => {
                error!(error = %err, "failed to fetch utility items");
                self.apply([
                    StatePatch::Fail(format!("Failed to fetch utility items: {err}")),
                    StatePatch::UtilityItems(Vec::new()),
                ]);
                Vec::new()
            }
        };

        self.apply([StatePatch::Finish(Activity::LoadingUtilityItems)]);
        items
    }

    /// Creates the location, then the appraisal that references it. If the
    /// appraisal write fails the new location is deleted again on a
    /// best-effort basis. Returns the new appraisal id.
    pub async fn create_appraisal_with_location(
        &self,
        draft: &AppraisalDraft,
        location: &LocationFields,
    ) -> Option<String> {
        self.apply([
            StatePatch::Begin(Activity::Submitting),
            StatePatch::ClearError,
        ]);

        let created = match self.create_pair(draft, location).await {
            Ok(appraisal_id) => {
                self.fetch_all_appraisals().await;
                Some(appraisal_id)
            }
            Err(message) => {
                error!(%message, "failed to create appraisal with location");
                self.apply([StatePatch::Fail(message)]);
                None
            }
        };

        self.apply([StatePatch::Finish(Activity::Submitting)]);
        created
    }

    async fn create_pair(
        &self,
        draft: &AppraisalDraft,
        location: &LocationFields,
    ) -> Result<String, String> {
        let location_id = self
            .locations
            .create(location)
            .await
            .ok_or_else(|| "Location creation failed or did not return an ID.".to_string())?;
        info!(%location_id, "location created for new appraisal");

        let appraisal = Appraisal {
            id: new_appraisal_id(),
            client_name: draft.client_name.clone(),
            property_address: draft.property_address.clone(),
            status: draft.status.clone(),
            report_type: draft.report_type.clone(),
            creation_date: draft
                .creation_date
                .clone()
                .or_else(|| Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))),
            location_ref: Some(LocationRef::for_location(&location_id).to_string()),
            assigned_user_id: draft.assigned_user_id.clone(),
            selected_for_report: BTreeMap::new(),
        };

        match self.appraisals.create(&appraisal).await {
            Some(appraisal_id) => {
                info!(%appraisal_id, %location_id, "appraisal created");
                Ok(appraisal_id)
            }
            None => {
                if self.locations.delete(&location_id).await {
                    warn!(%location_id, "cleaned up location after failed appraisal creation");
                } else {
                    error!(%location_id, "failed to clean up orphaned location");
                }
                Err("Appraisal creation failed or did not return an ID.".to_string())
            }
        }
    }

    /// Updates the location (when an id and a non-empty attribute set are
    /// supplied) and then the appraisal, refreshing the cached pair and list.
    pub async fn update_appraisal_with_location(
        &self,
        appraisal_id: &str,
        changes: &AppraisalChanges,
        location_id: Option<&str>,
        location: Option<&LocationFields>,
    ) -> bool {
        self.apply([
            StatePatch::Begin(Activity::Submitting),
            StatePatch::ClearError,
        ]);

        let updated = match self
            .update_pair(appraisal_id, changes, location_id, location)
            .await
        {
            Ok(()) => {
                self.fetch_appraisal_with_location(appraisal_id).await;
                self.fetch_all_appraisals().await;
                true
            }
            Err(message) => {
                error!(%appraisal_id, %message, "failed to update appraisal with location");
                self.apply([StatePatch::Fail(message)]);
                false
            }
        };

        self.apply([StatePatch::Finish(Activity::Submitting)]);
        updated
    }

    async fn update_pair(
        &self,
        appraisal_id: &str,
        changes: &AppraisalChanges,
        location_id: Option<&str>,
        location: Option<&LocationFields>,
    ) -> Result<(), String> {
        let location = location.filter(|fields| !fields.is_empty());
        match (location_id.filter(|id| !id.is_empty()), location) {
            (Some(location_id), Some(fields)) => {
                if !self.locations.update(location_id, fields).await {
                    return Err(format!("Failed to update location {location_id}."));
                }
                info!(%location_id, "location updated");
            }
            (None, Some(_)) => warn!(
                %appraisal_id,
                "location attributes supplied without a location id; location left unchanged"
            ),
            _ => {}
        }

        if !self.appraisals.update(appraisal_id, changes).await {
            return Err(format!("Failed to update appraisal {appraisal_id}."));
        }
        info!(%appraisal_id, "appraisal updated");
        Ok(())
    }

    /// Replaces the appraisal's report selections with the `true` entries of
    /// `selections`; no other appraisal attribute is written.
    pub async fn update_report_selections(
        &self,
        appraisal_id: &str,
        selections: &BTreeMap<String, bool>,
    ) -> bool {
        self.apply([
            StatePatch::Begin(Activity::Submitting),
            StatePatch::ClearError,
        ]);

        let selected: BTreeMap<String, bool> = selections
            .iter()
            .filter(|(_, included)| **included)
            .map(|(item_id, _)| (item_id.clone(), true))
            .collect();
        let changes = AppraisalChanges {
            selected_for_report: Some(selected),
            ..AppraisalChanges::default()
        };

        let updated = if self.appraisals.update(appraisal_id, &changes).await {
            self.fetch_appraisal_with_location(appraisal_id).await;
            true
        } else {
            error!(%appraisal_id, "failed to update report selections");
            self.apply([StatePatch::Fail(format!(
                "Failed to update report selections for appraisal {appraisal_id}."
            ))]);
            false
        };

        self.apply([StatePatch::Finish(Activity::Submitting)]);
        updated
    }
}
