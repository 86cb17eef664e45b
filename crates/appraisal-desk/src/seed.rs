//! Development fixture set: two locations, two appraisals referencing them,
//! three report utilities, and two activity log entries.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use crate::records::{
    Appraisal, AppraisalRecords, LocationFields, LocationRecords, LocationRef, LogEntryDraft,
    LogRecords, UtilityItemDraft, UtilityItemType, UtilityRecords,
};
use crate::store::DocumentStore;

pub const COMMERCIAL_PROPERTY: &str = "Downtown Office Tower";
pub const RESIDENTIAL_PROPERTY: &str = "Ocean View Condos";

/// Count of documents written per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub locations: usize,
    pub appraisals: usize,
    pub utility_items: usize,
    pub logs: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("no location found with property name '{0}'")]
    MissingLocation(&'static str),
}

fn some(value: &str) -> Option<String> {
    Some(value.to_string())
}

pub fn commercial_location() -> LocationFields {
    LocationFields {
        property_name: some(COMMERCIAL_PROPERTY),
        address_line1: some("456 Main St"),
        address_line2: some(""),
        city: some("Metro City"),
        state: some("GA"),
        zip_code: some("30303"),
        county: some("Fulton County"),
        msa: some("Metro City MSA"),
        latitude: Some(33.7537),
        longitude: Some(-84.3863),
        legal_description: some("Unit 100, Metro City Towers Condominium"),
        additional_location_info: some("Class A office space"),
        inside_city_limits: Some(true),
        lot: some("100"),
        property_type: some("Commercial Office"),
        former_id: some("MCTOWER001"),
        property_originator: some("Urban Development Corp."),
        property_entry_date: some("2022-05-20"),
        parcel_id: some("012-345-678"),
        ..LocationFields::default()
    }
}

pub fn residential_location() -> LocationFields {
    LocationFields {
        property_name: some(RESIDENTIAL_PROPERTY),
        address_line1: some("123 Seaside Ave"),
        address_line2: some("Unit 5B"),
        city: some("Beachville"),
        state: some("FL"),
        zip_code: some("33139"),
        county: some("Miami-Dade County"),
        parish: some("St. James Parish"),
        msa: some("Beachville Metro Area"),
        latitude: Some(25.7907),
        longitude: Some(-80.13),
        legal_description: some("Lot 1, Block A, Seaside Subdivision"),
        additional_location_info: some("Oceanfront building, Gated Community"),
        inside_city_limits: Some(true),
        section_township_range: some("S15 T2S R42E"),
        block: some("A"),
        lot: some("1"),
        property_type: some("Residential Condominium"),
        mls_id: some("A1234567"),
        property_originator: some("Coastal Properties Inc."),
        property_entry_date: some("2023-01-15"),
        parcel_id: some("987-654-321"),
        ..LocationFields::default()
    }
}

fn appraisals(commercial_id: &str, residential_id: &str) -> [Appraisal; 2] {
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    [
        Appraisal {
            id: "APP-001".to_string(),
            client_name: "Global Corp Inc.".to_string(),
            property_address: "456 Main St".to_string(),
            status: "data_entry".to_string(),
            report_type: "Full Appraisal".to_string(),
            creation_date: Some(today.clone()),
            location_ref: Some(LocationRef::for_location(commercial_id).to_string()),
            assigned_user_id: some("user_admin_01"),
            ..Appraisal::default()
        },
        Appraisal {
            id: "APP-002".to_string(),
            client_name: "Jane Doe".to_string(),
            property_address: "123 Seaside Ave, Unit 5B".to_string(),
            status: "review_pending".to_string(),
            report_type: "Desktop Appraisal".to_string(),
            creation_date: Some(today),
            location_ref: Some(LocationRef::for_location(residential_id).to_string()),
            assigned_user_id: some("user_appraiser_02"),
            ..Appraisal::default()
        },
    ]
}

fn utility_items() -> [(&'static str, UtilityItemDraft); 3] {
    [
        (
            "standard_disclaimer_01",
            UtilityItemDraft {
                utility_name: "Standard Disclaimer 01".to_string(),
                item_type: UtilityItemType::SelectableDisclaimer,
                content: "This is a standard disclaimer. All information provided is for general \
                          informational purposes only, and all information is provided in good \
                          faith, however, we make no representation or warranty of any kind, \
                          express or implied, regarding the accuracy, adequacy, validity, \
                          reliability, availability, or completeness of any information."
                    .to_string(),
                category: some("Legal Disclaimers"),
            },
        ),
        (
            "market_condition_text_block_A",
            UtilityItemDraft {
                utility_name: "Market Condition Text Block A".to_string(),
                item_type: UtilityItemType::SelectableTextBlock,
                content: "Market conditions are currently stable with moderate growth observed \
                          in the commercial sector. Residential property values have seen a \
                          slight increase over the past quarter."
                    .to_string(),
                category: some("Market Analysis"),
            },
        ),
        (
            "property_inspection_scope_001",
            UtilityItemDraft {
                utility_name: "Property Inspection Scope - Standard".to_string(),
                item_type: UtilityItemType::SelectableTextBlock,
                content: "The scope of the property inspection included a visual examination \
                          of the accessible interior and exterior areas of the subject \
                          property. This inspection was performed in accordance with generally \
                          accepted appraisal standards."
                    .to_string(),
                category: None,
            },
        ),
    ]
}

fn log_entries() -> [LogEntryDraft; 2] {
    [
        LogEntryDraft {
            appraisal_id: "APP-001".to_string(),
            user_id: "user_admin_01".to_string(),
            action_description:
                "Appraisal APP-001 status changed from 'data_entry' to 'review_pending'."
                    .to_string(),
            details: Some(json!({
                "old_status": "data_entry",
                "new_status": "review_pending",
            })),
        },
        LogEntryDraft {
            appraisal_id: "APP-002".to_string(),
            user_id: "user_appraiser_02".to_string(),
            action_description: "Client name updated for APP-002.".to_string(),
            details: None,
        },
    ]
}

async fn location_id_for<S>(
    locations: &LocationRecords<S>,
    property_name: &'static str,
) -> Result<String, SeedError>
where
    S: DocumentStore + ?Sized,
{
    locations
        .get_by_property_name(property_name)
        .await
        .into_iter()
        .next()
        .map(|location| location.id)
        .ok_or(SeedError::MissingLocation(property_name))
}

/// Writes the fixture set. Individual write failures are logged and skipped;
/// seeding aborts only when a seeded location cannot be found again to link
/// the appraisals to it.
pub async fn seed<S>(store: Arc<S>) -> Result<SeedSummary, SeedError>
where
    S: DocumentStore + ?Sized,
{
    let locations = LocationRecords::new(store.clone());
    let appraisal_records = AppraisalRecords::new(store.clone());
    let utilities = UtilityRecords::new(store.clone());
    let logs = LogRecords::new(store);
    let mut summary = SeedSummary::default();

    for fields in [commercial_location(), residential_location()] {
        match locations.create(&fields).await {
            Some(location_id) => {
                info!(%location_id, property_name = ?fields.property_name, "seeded location");
                summary.locations += 1;
            }
            None => error!(property_name = ?fields.property_name, "failed to seed location"),
        }
    }

    let commercial_id = location_id_for(&locations, COMMERCIAL_PROPERTY).await?;
    let residential_id = location_id_for(&locations, RESIDENTIAL_PROPERTY).await?;

    for appraisal in appraisals(&commercial_id, &residential_id) {
        match appraisal_records.create(&appraisal).await {
            Some(appraisal_id) => {
                info!(%appraisal_id, "seeded appraisal");
                summary.appraisals += 1;
            }
            None => error!(appraisal_id = %appraisal.id, "failed to seed appraisal"),
        }
    }

    for (id, draft) in utility_items() {
        if utilities.create(id, &draft).await {
            info!(utility_id = id, "seeded report utility");
            summary.utility_items += 1;
        } else {
            error!(utility_id = id, "failed to seed report utility");
        }
    }

    for entry in log_entries() {
        match logs.create(&entry).await {
            Some(log_id) => {
                info!(%log_id, appraisal_id = %entry.appraisal_id, "seeded appraisal log");
                summary.logs += 1;
            }
            None => error!(appraisal_id = %entry.appraisal_id, "failed to seed appraisal log"),
        }
    }

    info!(?summary, "seeding completed");
    Ok(summary)
}
