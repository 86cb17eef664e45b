use serde::Serialize;

use crate::records::{Appraisal, Location, UtilityItem};

/// The appraisal currently open for viewing or editing, joined with its location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppraisalDetail {
    pub appraisal: Option<Appraisal>,
    pub location: Option<Location>,
}

/// Independent in-flight markers; each toggles idle -> busy -> idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    LoadingAppraisals,
    LoadingCurrent,
    LoadingUtilityItems,
    Submitting,
}

/// A single state transition produced by an orchestration step.
#[derive(Debug, Clone, PartialEq)]
pub enum StatePatch {
    Begin(Activity),
    Finish(Activity),
    ClearError,
    Fail(String),
    Appraisals(Vec<Appraisal>),
    Current(AppraisalDetail),
    UtilityItems(Vec<UtilityItem>),
}

/// Cached collections plus UI-facing flags. `error` is shared by every
/// operation: the latest failure replaces any earlier message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeskState {
    pub appraisals: Vec<Appraisal>,
    pub current: AppraisalDetail,
    pub utility_items: Vec<UtilityItem>,
    pub loading_appraisals: bool,
    pub loading_current: bool,
    pub loading_utility_items: bool,
    pub submitting: bool,
    pub error: Option<String>,
}

impl DeskState {
    pub fn apply(&mut self, patch: StatePatch) {
        match patch {
            StatePatch::Begin(activity) => *self.flag_mut(activity) = true,
            StatePatch::Finish(activity) => *self.flag_mut(activity) = false,
            StatePatch::ClearError => self.error = None,
            StatePatch::Fail(message) => self.error = Some(message),
            StatePatch::Appraisals(appraisals) => self.appraisals = appraisals,
            StatePatch::Current(detail) => self.current = detail,
            StatePatch::UtilityItems(items) => self.utility_items = items,
        }
    }

    pub fn is_active(&self, activity: Activity) -> bool {
        match activity {
            Activity::LoadingAppraisals => self.loading_appraisals,
            Activity::LoadingCurrent => self.loading_current,
            Activity::LoadingUtilityItems => self.loading_utility_items,
            Activity::Submitting => self.submitting,
        }
    }

    fn flag_mut(&mut self, activity: Activity) -> &mut bool {
        match activity {
            Activity::LoadingAppraisals => &mut self.loading_appraisals,
            Activity::LoadingCurrent => &mut self.loading_current,
            Activity::LoadingUtilityItems => &mut self.loading_utility_items,
            Activity::Submitting => &mut self.submitting,
        }
    }
}
