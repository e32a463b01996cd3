//! In-memory store and the record lifecycle operations.

/// New-record assembly.
pub mod builder;
/// Single active edit session tracking.
pub mod session;
/// Per-identity record store.
pub mod store;
/// Prior-value suggestions for autocomplete.
pub mod suggest;
