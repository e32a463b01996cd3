//! Runtime event stream payloads.

use crate::types::RecordId;

/// Events emitted from the single-writer portal loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalEvent {
    /// A new request was stored.
    Submitted {
        /// New record id.
        id: RecordId,
    },
    /// A record was opened for editing.
    EditStarted {
        /// Record being edited.
        id: RecordId,
    },
    /// An edit session ended without saving.
    EditAbandoned {
        /// Record that was being edited.
        id: RecordId,
    },
    /// An edit was committed.
    Updated {
        /// Replaced record id.
        id: RecordId,
    },
    /// The store was written through the backend.
    Saved {
        /// Number of records written.
        records: usize,
    },
}
