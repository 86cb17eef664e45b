//! Appraisal record management on top of a hosted document store.
//!
//! The crate is layered leaf-first: [`store`] abstracts the document database,
//! [`records`] wraps each collection with non-failing access operations, and
//! [`desk`] composes those into the shared orchestration state served over HTTP.
//! [`seed`] writes a small linked fixture set for development.

pub mod config;
pub mod desk;
pub mod error;
pub mod records;
pub mod seed;
pub mod store;
pub mod telemetry;
