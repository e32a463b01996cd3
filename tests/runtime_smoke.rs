use std::{sync::{Arc, Mutex}, time::Duration};

use tempfile::TempDir;
use uuid::Uuid;

use quoteportal::{
    core::store::{RecordStore, StoreSnapshot},
    persist::{json_file::JsonFileBackend, PersistError, PersistResult, StoreBackend},
    record::RecordDraft,
    runtime::{
        events::PortalEvent,
        handle::{spawn_portal, PortalConfig, PortalError},
    },
    types::GeneralField,
};

fn draft(sponsor: &str) -> RecordDraft {
    RecordDraft::new()
        .field(GeneralField::Sponsor, sponsor)
        .field(GeneralField::Protocol, "P-1")
}

/// Backend that fails every save once `fail` is set.
struct FlakySink {
    saves: Arc<Mutex<Vec<usize>>>,
    fail: Arc<Mutex<bool>>,
}

impl StoreBackend for FlakySink {
    fn load(&self, _owner: &str) -> PersistResult<Option<StoreSnapshot>> {
        Ok(None)
    }

    fn save(&mut self, _owner: &str, snapshot: &StoreSnapshot) -> PersistResult<()> {
        if *self.fail.lock().expect("lock") {
            return Err(PersistError::Message("disk full".to_string()));
        }
        self.saves.lock().expect("lock").push(snapshot.records.len());
        Ok(())
    }
}

#[tokio::test]
async fn runtime_submit_edit_query_and_events_ordered() {
    let handle = spawn_portal(RecordStore::new("jdoe"), None, PortalConfig::default());
    let mut sub = handle.subscribe();

    let rec = handle.submit(draft("Acme")).await.expect("submit");
    let session = handle.begin_edit(rec.id).await.expect("begin");
    assert_eq!(handle.active_edit().await.expect("active"), Some(rec.id));

    let edited = session.seed_draft().field(GeneralField::Sponsor, "Beta");
    let saved = handle.commit_edit(session, edited).await.expect("commit");
    assert_eq!(saved.submitted_at, rec.submitted_at);
    assert_eq!(handle.active_edit().await.expect("active"), None);

    let got = handle.get(rec.id).await.expect("get").expect("record");
    assert_eq!(got.general.get(GeneralField::Sponsor), Some("Beta"));
    assert_eq!(handle.prior_values("Sponsor").await.expect("prior"), vec!["Beta"]);
    assert!(handle.prior_values("Nope").await.expect("prior").is_empty());
    assert_eq!(handle.export().await.expect("export").len(), 1);

    let mut seen = Vec::new();
    for _ in 0..3 {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event")
            .expect("recv");
        seen.push(evt);
    }
    assert_eq!(
        seen,
        vec![
            PortalEvent::Submitted { id: rec.id },
            PortalEvent::EditStarted { id: rec.id },
            PortalEvent::Updated { id: rec.id },
        ]
    );

    handle.shutdown().await.expect("shutdown");
    assert!(matches!(handle.records().await, Err(PortalError::ChannelClosed)));
}

#[tokio::test]
async fn begin_on_missing_record_is_reported() {
    let handle = spawn_portal(RecordStore::new("jdoe"), None, PortalConfig::default());
    let missing = Uuid::new_v4();
    let err = handle.begin_edit(missing).await.expect_err("missing");
    assert!(matches!(err, PortalError::Session(_)), "{err:?}");
    assert!(handle.records().await.expect("records").is_empty());
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn superseded_session_expires_and_abandon_leaves_store() {
    let handle = spawn_portal(RecordStore::new("jdoe"), None, PortalConfig::default());
    let a = handle.submit(draft("Acme")).await.expect("a");
    let b = handle.submit(draft("Beta")).await.expect("b");

    let stale = handle.begin_edit(a.id).await.expect("begin a");
    let current = handle.begin_edit(b.id).await.expect("begin b");

    let err = handle.commit_edit(stale, draft("Gamma")).await.expect_err("stale");
    assert!(matches!(err, PortalError::Session(_)), "{err:?}");

    handle.abandon_edit(current).await.expect("abandon");
    let records = handle.records().await.expect("records");
    assert_eq!(records, vec![a, b]);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn write_through_persists_each_mutation() {
    let tmp = TempDir::new().expect("tmp");
    let backend = JsonFileBackend::open(tmp.path()).expect("open");
    let store = RecordStore::open(&backend, "jdoe").expect("load");
    let handle = spawn_portal(store, Some(Box::new(backend.clone())), PortalConfig::default());

    let rec = handle.submit(draft("Acme")).await.expect("submit");
    let on_disk = RecordStore::open(&backend, "jdoe").expect("reload");
    assert_eq!(on_disk.get(rec.id), Some(&rec));

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn failed_save_rolls_back_in_memory_change() {
    let saves = Arc::new(Mutex::new(Vec::new()));
    let fail = Arc::new(Mutex::new(false));
    let sink = FlakySink {
        saves: Arc::clone(&saves),
        fail: Arc::clone(&fail),
    };
    let handle = spawn_portal(RecordStore::new("jdoe"), Some(Box::new(sink)), PortalConfig::default());

    let kept = handle.submit(draft("Acme")).await.expect("submit");
    *fail.lock().expect("lock") = true;

    let err = handle.submit(draft("Beta")).await.expect_err("save fails");
    assert!(matches!(err, PortalError::Persist(_)), "{err:?}");

    let session = handle.begin_edit(kept.id).await.expect("begin");
    let err = handle
        .commit_edit(session, draft("Gamma"))
        .await
        .expect_err("save fails");
    assert!(matches!(err, PortalError::Persist(_)), "{err:?}");

    assert_eq!(handle.records().await.expect("records"), vec![kept]);
    assert_eq!(*saves.lock().expect("lock"), vec![1]);

    *fail.lock().expect("lock") = false;
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn deferred_saves_happen_on_flush_and_shutdown() {
    let saves = Arc::new(Mutex::new(Vec::new()));
    let sink = FlakySink {
        saves: Arc::clone(&saves),
        fail: Arc::new(Mutex::new(false)),
    };
    let cfg = PortalConfig {
        save_on_write: false,
        ..PortalConfig::default()
    };
    let handle = spawn_portal(RecordStore::new("jdoe"), Some(Box::new(sink)), cfg);

    handle.submit(draft("Acme")).await.expect("submit");
    handle.submit(draft("Beta")).await.expect("submit");
    assert!(saves.lock().expect("lock").is_empty());

    handle.flush().await.expect("flush");
    handle.submit(draft("Gamma")).await.expect("submit");
    handle.shutdown().await.expect("shutdown");

    assert_eq!(*saves.lock().expect("lock"), vec![2, 3]);
}

#[tokio::test]
async fn zero_capacities_are_raised_to_one() {
    let cfg = PortalConfig {
        command_queue_bound: 0,
        event_capacity: 0,
        ..PortalConfig::default()
    };
    let handle = spawn_portal(RecordStore::new("jdoe"), None, cfg);
    let mut sub = handle.subscribe();

    let rec = handle.submit(draft("Acme")).await.expect("submit");
    assert_eq!(sub.recv().await.expect("event"), PortalEvent::Submitted { id: rec.id });
    assert_eq!(handle.records().await.expect("records").len(), 1);
    handle.shutdown().await.expect("shutdown");
}
