//! `sitedesk-import` — Import reconciliation engine.
//!
//! Merges externally sourced tabular records (Dodge exports, office guides,
//! sales logs) into the entity store without duplicating data or clobbering
//! user-entered edits. Pure engine crate: consumes pre-normalized records
//! and the store traits, returns a report. Dry runs classify identically to
//! real runs and never write.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod merge;
pub mod model;

pub use config::ImportProfile;
pub use engine::{load_csv_records, run};
pub use error::ImportError;
pub use model::{Decision, IncomingRecord, RunReport};
