//! Flat tabular export of a store.

/// CSV rendering of projected rows.
pub mod csv;
/// Record-to-row projection.
pub mod projector;

pub use projector::{ExportRow, project};
