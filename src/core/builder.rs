use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::record::{Record, RecordDraft};

/// Builds a new record stamped with the current instant.
///
/// "Other" selections are resolved here; see [`crate::record::resolve_sentinel`].
/// Persisting the result is the caller's job.
pub fn build(draft: RecordDraft) -> Record {
    build_at(draft, Utc::now())
}

/// [`build`] with an explicit submission instant.
pub fn build_at(draft: RecordDraft, submitted_at: DateTime<Utc>) -> Record {
    Record::assemble(Uuid::new_v4(), submitted_at, draft)
}
