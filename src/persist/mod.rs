//! Per-identity persistence backends.
//!
//! Both backends hold a full [`StoreSnapshot`] per owner and replace it on
//! every save. Concurrent writers of the same owner are not coordinated:
//! the last save wins.

/// One JSON file per identity.
pub mod json_file;
/// One SQLite row per identity.
pub mod sqlite;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::store::{StoreError, StoreSnapshot};

/// Persistence failures.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem access failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Persisted data exists but does not decode.
    #[error("stored records for {owner:?} are unreadable: {source}")]
    Corrupt {
        /// Identity whose data failed to decode.
        owner: String,
        /// Decode error.
        #[source]
        source: serde_json::Error,
    },
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Encoding a snapshot failed.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Decoded data violated a store invariant.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Anything else, such as a failed blocking task.
    #[error("{0}")]
    Message(String),
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// Load/save seam for one owner's records.
pub trait StoreBackend: Send {
    /// Returns `None` when nothing is stored for `owner`.
    fn load(&self, owner: &str) -> PersistResult<Option<StoreSnapshot>>;

    /// Replaces everything stored for `owner`.
    fn save(&mut self, owner: &str, snapshot: &StoreSnapshot) -> PersistResult<()>;
}
