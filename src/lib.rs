//! Quote request records for a small form portal: creation, prior-value
//! suggestions, single-session editing, tabular export, and per-identity
//! JSON persistence.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::RecordStore`]:
//! ```
//! use quoteportal::{
//!     core::{builder::build, session::EditTracker, store::RecordStore, suggest::prior_values},
//!     record::RecordDraft,
//!     types::{GeneralField, TherapeuticArea},
//! };
//!
//! let mut store = RecordStore::new("jdoe");
//! let rec = build(
//!     RecordDraft::new()
//!         .field(GeneralField::Sponsor, "Acme")
//!         .area(TherapeuticArea::Allergy),
//! );
//! store.insert(rec.clone()).expect("insert");
//! assert_eq!(prior_values(&store, GeneralField::Sponsor), vec!["Acme"]);
//!
//! let mut edits = EditTracker::new();
//! let session = edits.begin(&store, rec.id).expect("begin");
//! let draft = session.seed_draft().field(GeneralField::Sponsor, "Beta");
//! let saved = edits.commit(session, draft, &mut store).expect("commit");
//! assert_eq!(saved.submitted_at, rec.submitted_at);
//! ```
//!
//! Runtime usage with a JSON file per identity:
//! ```no_run
//! use quoteportal::{
//!     core::store::RecordStore,
//!     persist::json_file::JsonFileBackend,
//!     record::RecordDraft,
//!     runtime::handle::{spawn_portal, PortalConfig},
//!     types::GeneralField,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backend = JsonFileBackend::open("data").expect("data dir");
//! let store = RecordStore::open(&backend, "jdoe").expect("load");
//! let handle = spawn_portal(store, Some(Box::new(backend)), PortalConfig::default());
//! let rec = handle
//!     .submit(RecordDraft::new().other(GeneralField::Sponsor, "Zeta Bio"))
//!     .await
//!     .expect("submit");
//! assert_eq!(rec.general.get(GeneralField::Sponsor), Some("Zeta Bio"));
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Record store and lifecycle operations.
pub mod core;
/// Flat export rows and CSV rendering.
pub mod export;
/// Persistence abstraction with JSON-file and SQLite backends.
pub mod persist;
/// Record, scope row, and draft types.
pub mod record;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared identifiers and form vocabularies.
pub mod types;
