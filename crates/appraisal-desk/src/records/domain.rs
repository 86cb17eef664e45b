use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Appraisal engagement keyed by its business id (`A-<millis>` or seeded `APP-001`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appraisal {
    pub id: String,
    pub client_name: String,
    /// Denormalized copy of the location's street address.
    pub property_address: String,
    pub status: String,
    pub report_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,
    /// Utility item id -> included in the generated report.
    pub selected_for_report: BTreeMap<String, bool>,
}

/// Core attributes captured when an appraisal is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppraisalDraft {
    pub client_name: String,
    pub property_address: String,
    pub status: String,
    pub report_type: String,
    pub creation_date: Option<String>,
    pub assigned_user_id: Option<String>,
}

/// Partial appraisal update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppraisalChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_for_report: Option<BTreeMap<String, bool>>,
}

impl From<&AppraisalDraft> for AppraisalChanges {
    fn from(draft: &AppraisalDraft) -> Self {
        Self {
            client_name: Some(draft.client_name.clone()),
            property_address: Some(draft.property_address.clone()),
            status: Some(draft.status.clone()),
            report_type: Some(draft.report_type.clone()),
            assigned_user_id: draft.assigned_user_id.clone(),
            selected_for_report: None,
        }
    }
}

/// Descriptive attributes of a property location. Every attribute is optional;
/// unset attributes are omitted from writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_location_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inside_city_limits: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_township_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mls_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub former_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_originator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_entry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_id: Option<String>,
}

impl LocationFields {
    /// True when no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Stored location; the id is generated by the document store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(flatten)]
    pub fields: LocationFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityItemType {
    SelectableDisclaimer,
    SelectableTextBlock,
}

impl UtilityItemType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelectableDisclaimer => "selectable_disclaimer",
            Self::SelectableTextBlock => "selectable_text_block",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "selectable_disclaimer" => Some(Self::SelectableDisclaimer),
            "selectable_text_block" => Some(Self::SelectableTextBlock),
            _ => None,
        }
    }
}

/// Reusable report text (disclaimers, boilerplate blocks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityItem {
    pub id: String,
    pub utility_name: String,
    #[serde(rename = "type")]
    pub item_type: UtilityItemType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityItemDraft {
    pub utility_name: String,
    #[serde(rename = "type")]
    pub item_type: UtilityItemType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utility_name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<UtilityItemType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Append-only activity entry recorded against an appraisal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalLog {
    pub id: String,
    pub appraisal_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub action_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntryDraft {
    pub appraisal_id: String,
    pub user_id: String,
    pub action_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntryChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
