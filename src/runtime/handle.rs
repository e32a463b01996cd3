use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};

use crate::{
    core::{
        builder::build,
        session::{EditSession, EditTracker, SessionError},
        store::{RecordStore, StoreError},
        suggest::prior_values_for_label,
    },
    export::{ExportRow, project},
    persist::{PersistError, StoreBackend},
    record::{Record, RecordDraft},
    types::RecordId,
};

use super::events::PortalEvent;

/// Errors returned through [`PortalHandle`].
#[derive(Debug, Error)]
pub enum PortalError {
    /// Edit session misuse or missing record.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Store invariant violation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Write-through failed; the in-memory change was rolled back.
    #[error(transparent)]
    Persist(#[from] PersistError),
    /// The runtime loop has stopped.
    #[error("portal runtime has shut down")]
    ChannelClosed,
}

/// Runtime tuning.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Save the whole store after every mutation.
    pub save_on_write: bool,
    /// Pending command capacity. Values below 1 are raised to 1.
    pub command_queue_bound: usize,
    /// Broadcast buffer for [`PortalEvent`]s. Values below 1 are raised to 1.
    pub event_capacity: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            save_on_write: true,
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable handle to one identity's portal loop.
pub struct PortalHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<PortalEvent>,
}

impl Clone for PortalHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Submit {
        draft: RecordDraft,
        resp: oneshot::Sender<Result<Record, PortalError>>,
    },
    BeginEdit {
        id: RecordId,
        resp: oneshot::Sender<Result<EditSession, PortalError>>,
    },
    CommitEdit {
        session: EditSession,
        draft: RecordDraft,
        resp: oneshot::Sender<Result<Record, PortalError>>,
    },
    AbandonEdit {
        session: EditSession,
        resp: oneshot::Sender<Result<(), PortalError>>,
    },
    ActiveEdit {
        resp: oneshot::Sender<Option<RecordId>>,
    },
    Get {
        id: RecordId,
        resp: oneshot::Sender<Option<Record>>,
    },
    Records {
        resp: oneshot::Sender<Vec<Record>>,
    },
    PriorValues {
        field: String,
        resp: oneshot::Sender<Vec<String>>,
    },
    Export {
        resp: oneshot::Sender<Vec<ExportRow>>,
    },
    Flush {
        resp: oneshot::Sender<Result<(), PortalError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), PortalError>>,
    },
}

type SharedBackend = Arc<Mutex<Box<dyn StoreBackend>>>;

struct PortalState {
    store: RecordStore,
    edits: EditTracker,
    backend: Option<SharedBackend>,
}

/// Starts the command loop for `store` on the current tokio runtime.
///
/// Commands run one at a time, so each user action completes before the next
/// is looked at. Without a backend nothing is persisted.
pub fn spawn_portal(
    store: RecordStore,
    backend: Option<Box<dyn StoreBackend>>,
    config: PortalConfig,
) -> PortalHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<PortalEvent>(config.event_capacity.max(1));

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut state = PortalState {
            store,
            edits: EditTracker::new(),
            backend: backend.map(|b| Arc::new(Mutex::new(b))),
        };

        while let Some(cmd) = cmd_rx.recv().await {
            let done = handle_command(cmd, &mut state, &events_tx_loop, &config).await;
            if done {
                break;
            }
        }
        tracing::debug!(owner = state.store.owner(), "portal loop stopped");
    });

    PortalHandle { cmd_tx, events_tx }
}

impl PortalHandle {
    /// New receiver for subsequent [`PortalEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.events_tx.subscribe()
    }

    /// Builds, stores, and persists a new request.
    pub async fn submit(&self, draft: RecordDraft) -> Result<Record, PortalError> {
        self.request(|resp| Command::Submit { draft, resp }).await?
    }

    /// Opens a record for editing, replacing any active session.
    pub async fn begin_edit(&self, id: RecordId) -> Result<EditSession, PortalError> {
        self.request(|resp| Command::BeginEdit { id, resp }).await?
    }

    /// Saves an edit and ends its session.
    pub async fn commit_edit(&self, session: EditSession, draft: RecordDraft) -> Result<Record, PortalError> {
        self.request(|resp| Command::CommitEdit { session, draft, resp })
            .await?
    }

    /// Ends an edit session without saving.
    pub async fn abandon_edit(&self, session: EditSession) -> Result<(), PortalError> {
        self.request(|resp| Command::AbandonEdit { session, resp }).await?
    }

    /// Record currently open for editing, if any.
    pub async fn active_edit(&self) -> Result<Option<RecordId>, PortalError> {
        self.request(|resp| Command::ActiveEdit { resp }).await
    }

    /// Current copy of one record.
    pub async fn get(&self, id: RecordId) -> Result<Option<Record>, PortalError> {
        self.request(|resp| Command::Get { id, resp }).await
    }

    /// All records in store order.
    pub async fn records(&self) -> Result<Vec<Record>, PortalError> {
        self.request(|resp| Command::Records { resp }).await
    }

    /// Autocomplete values for the field with this label.
    pub async fn prior_values(&self, field: impl Into<String>) -> Result<Vec<String>, PortalError> {
        let field = field.into();
        self.request(|resp| Command::PriorValues { field, resp }).await
    }

    /// Export rows, one per record in store order.
    pub async fn export(&self) -> Result<Vec<ExportRow>, PortalError> {
        self.request(|resp| Command::Export { resp }).await
    }

    /// Saves the store now, whatever `save_on_write` says.
    pub async fn flush(&self) -> Result<(), PortalError> {
        self.request(|resp| Command::Flush { resp }).await?
    }

    /// Stops the loop, saving first when writes were deferred.
    pub async fn shutdown(&self) -> Result<(), PortalError> {
        self.request(|resp| Command::Shutdown { resp }).await?
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, PortalError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| PortalError::ChannelClosed)?;
        rx.await.map_err(|_| PortalError::ChannelClosed)
    }
}

async fn handle_command(
    cmd: Command,
    state: &mut PortalState,
    events_tx: &broadcast::Sender<PortalEvent>,
    config: &PortalConfig,
) -> bool {
    match cmd {
        Command::Submit { draft, resp } => {
            let rec = build(draft);
            let id = rec.id;
            let res = match state.store.insert(rec.clone()) {
                Err(err) => Err(PortalError::from(err)),
                Ok(()) => match write_through(state, events_tx, config.save_on_write).await {
                    Ok(()) => {
                        tracing::info!(%id, "request submitted");
                        let _ = events_tx.send(PortalEvent::Submitted { id });
                        Ok(rec)
                    }
                    Err(err) => {
                        tracing::warn!(%id, error = %err, "save failed, dropping new request");
                        state.store.remove(id);
                        Err(err)
                    }
                },
            };
            let _ = resp.send(res);
        }
        Command::BeginEdit { id, resp } => {
            let res = state
                .edits
                .begin(&state.store, id)
                .map_err(PortalError::from)
                .inspect(|_| {
                    let _ = events_tx.send(PortalEvent::EditStarted { id });
                });
            let _ = resp.send(res);
        }
        Command::CommitEdit { session, draft, resp } => {
            let id = session.id();
            let prior = state.store.get_cloned(id);
            let res = match state.edits.commit(session, draft, &mut state.store) {
                Err(err) => Err(PortalError::from(err)),
                Ok(rec) => match write_through(state, events_tx, config.save_on_write).await {
                    Ok(()) => {
                        let _ = events_tx.send(PortalEvent::Updated { id });
                        Ok(rec)
                    }
                    Err(err) => {
                        tracing::warn!(%id, error = %err, "save failed, restoring previous record");
                        if let Some(prior) = prior {
                            let _ = state.store.replace(prior);
                        }
                        Err(err)
                    }
                },
            };
            let _ = resp.send(res);
        }
        Command::AbandonEdit { session, resp } => {
            let id = session.id();
            let res = state
                .edits
                .abandon(session)
                .map_err(PortalError::from)
                .inspect(|_| {
                    let _ = events_tx.send(PortalEvent::EditAbandoned { id });
                });
            let _ = resp.send(res);
        }
        Command::ActiveEdit { resp } => {
            let _ = resp.send(state.edits.active());
        }
        Command::Get { id, resp } => {
            let _ = resp.send(state.store.get_cloned(id));
        }
        Command::Records { resp } => {
            let _ = resp.send(state.store.iter().cloned().collect());
        }
        Command::PriorValues { field, resp } => {
            let _ = resp.send(prior_values_for_label(&state.store, &field));
        }
        Command::Export { resp } => {
            let _ = resp.send(project(&state.store));
        }
        Command::Flush { resp } => {
            let _ = resp.send(write_through(state, events_tx, true).await);
        }
        Command::Shutdown { resp } => {
            let out = write_through(state, events_tx, !config.save_on_write).await;
            let _ = resp.send(out);
            return true;
        }
    }

    false
}

async fn write_through(
    state: &PortalState,
    events_tx: &broadcast::Sender<PortalEvent>,
    enabled: bool,
) -> Result<(), PortalError> {
    let Some(backend) = state.backend.as_ref().filter(|_| enabled) else {
        return Ok(());
    };

    let snapshot = state.store.export_snapshot();
    let owner = state.store.owner().to_string();
    let records = snapshot.records.len();
    let backend = Arc::clone(backend);

    tokio::task::spawn_blocking(move || {
        let mut backend = backend.blocking_lock();
        backend.save(&owner, &snapshot)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))??;

    let _ = events_tx.send(PortalEvent::Saved { records });
    Ok(())
}
