//! Lab value extraction, classification and longitudinal tracking.
//!
//! Text from a lab report goes through [`panel::PanelParser`], which finds
//! every catalog test in it and classifies the values. Sessions are kept in
//! a [`history::HistoryStore`]; [`trend`] and [`compare`] read that history
//! back to describe how a user's results move over time.

pub mod aliases;
pub mod catalog;
pub mod classify;
pub mod compare;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod history;
pub mod models;
pub mod panel;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod trend;

pub use catalog::{ReferenceCatalog, ReferenceEntry};
pub use error::{LabError, LabResult};
pub use history::{HistoryStore, InMemoryHistory};
pub use panel::PanelParser;
