//! Orchestration over the record access layer.
//!
//! [`AppraisalDesk`] composes appraisal and location writes into single
//! operations and keeps the cached collections, in-flight flags, and the last
//! user-visible error. Failures never propagate out of an operation; they are
//! recorded in [`DeskState::error`] and the operation returns an empty value.

pub mod router;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;

pub use router::appraisal_router;
pub use service::AppraisalDesk;
pub use state::{Activity, AppraisalDetail, DeskState, StatePatch};
