use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    core::store::{RecordStore, StoreError},
    record::{Record, RecordDraft},
    types::RecordId,
};

/// Edit session failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The record to edit is not in the store.
    #[error("record {0} not found")]
    NotFound(RecordId),
    /// The handle was superseded by a newer session or already ended.
    #[error("edit session for record {0} is no longer active")]
    SessionExpired(RecordId),
}

/// Handle for one in-progress edit.
///
/// Holds a snapshot of the record as it was when editing began; the stored
/// record is untouched until [`EditTracker::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    generation: u64,
    snapshot: Record,
}

impl EditSession {
    /// Id of the record being edited.
    pub fn id(&self) -> RecordId {
        self.snapshot.id
    }

    /// Record content captured by `begin`.
    pub fn snapshot(&self) -> &Record {
        &self.snapshot
    }

    /// Original submission instant, carried over by commit.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.snapshot.submitted_at
    }

    /// Draft pre-filled with every editable field of the snapshot.
    ///
    /// Commit replaces the whole record, so surfaces should start from this
    /// draft and resupply every field.
    pub fn seed_draft(&self) -> RecordDraft {
        self.snapshot.to_draft()
    }
}

/// Owns the single active edit slot for one interaction context.
#[derive(Debug, Default)]
pub struct EditTracker {
    active: Option<(u64, RecordId)>,
    next_generation: u64,
}

impl EditTracker {
    /// Creates a tracker with no active session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the record currently open for editing.
    pub fn active(&self) -> Option<RecordId> {
        self.active.map(|(_, id)| id)
    }

    /// Opens `id` for editing, silently replacing any active session.
    ///
    /// On `NotFound` the active session, if any, is left as it was.
    pub fn begin(&mut self, store: &RecordStore, id: RecordId) -> Result<EditSession, SessionError> {
        let snapshot = store.get_cloned(id).ok_or(SessionError::NotFound(id))?;

        if let Some((_, prev)) = self.active {
            tracing::debug!(%prev, next = %id, "replacing active edit session");
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        self.active = Some((generation, id));

        Ok(EditSession { generation, snapshot })
    }

    /// Replaces the stored record with the draft's content and ends the session.
    ///
    /// This is a full replace: fields absent from `draft` are dropped. The id
    /// and `submitted_at` always come from the session.
    pub fn commit(
        &mut self,
        session: EditSession,
        draft: RecordDraft,
        store: &mut RecordStore,
    ) -> Result<Record, SessionError> {
        self.end(&session)?;

        let replacement = Record::assemble(session.id(), session.submitted_at(), draft);
        store
            .replace(replacement.clone())
            .map_err(|err| match err {
                StoreError::MissingRecord(id) | StoreError::AlreadyExists(id) => SessionError::NotFound(id),
            })?;

        tracing::info!(id = %replacement.id, "committed edit");
        Ok(replacement)
    }

    /// Ends the session without touching the store.
    pub fn abandon(&mut self, session: EditSession) -> Result<(), SessionError> {
        self.end(&session)
    }

    fn end(&mut self, session: &EditSession) -> Result<(), SessionError> {
        match self.active {
            Some((generation, id)) if generation == session.generation && id == session.id() => {
                self.active = None;
                Ok(())
            }
            _ => Err(SessionError::SessionExpired(session.id())),
        }
    }
}
