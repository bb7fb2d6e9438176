//! Integration tests for the sync coordinator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use studium_core::{
    Connectivity, ContentSection, Entity, Error, RemoteContentSource, Result, SyncableContent,
};
use studium_store::{LocalContentStore, MemoryStorage};
use studium_sync::{SyncConfig, SyncCoordinator, SyncEvent};

struct StaticConnectivity(bool);

#[async_trait]
impl Connectivity for StaticConnectivity {
    async fn is_connected(&self) -> bool {
        self.0
    }
}

/// Scriptable remote: serves a fixed snapshot, optionally failing, and can
/// block each fetch on a notify gate until the test releases it.
struct ScriptedRemote {
    content: SyncableContent,
    fail: bool,
    gate: Option<Arc<Notify>>,
    fetch_count: AtomicUsize,
}

impl ScriptedRemote {
    fn serving(content: SyncableContent) -> Self {
        Self {
            content,
            fail: false,
            gate: None,
            fetch_count: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            content: SyncableContent::default(),
            fail: true,
            gate: None,
            fetch_count: AtomicUsize::new(0),
        }
    }

    fn gated(content: SyncableContent, gate: Arc<Notify>) -> Self {
        Self {
            content,
            fail: false,
            gate: Some(gate),
            fetch_count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RemoteContentSource for ScriptedRemote {
    async fn fetch_since(&self, _since_ms: i64) -> Result<SyncableContent> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(Error::Request("connection reset".to_string()));
        }
        Ok(self.content.clone())
    }
}

fn remote_snapshot() -> SyncableContent {
    SyncableContent {
        topics: vec![Entity::bare("topic-1"), Entity::bare("topic-2")],
        quizzes: vec![Entity::bare("quiz-1")],
        last_sync_timestamp: 0,
        ..Default::default()
    }
}

fn coordinator_with(
    remote: Arc<dyn RemoteContentSource>,
    online: bool,
) -> (SyncCoordinator, LocalContentStore) {
    let storage = Arc::new(MemoryStorage::new());
    let content = LocalContentStore::new(storage);
    let coordinator = SyncCoordinator::new(
        content.clone(),
        remote,
        Arc::new(StaticConnectivity(online)),
        SyncConfig::default().with_enabled(false),
    );
    (coordinator, content)
}

#[tokio::test]
async fn successful_sync_persists_merged_snapshot() {
    let remote = Arc::new(ScriptedRemote::serving(remote_snapshot()));
    let (coordinator, content) = coordinator_with(remote, true);

    let report = coordinator.sync_content().await;
    assert!(report.success, "unexpected failure: {:?}", report.error);
    let synced = report.synced.expect("successful report carries the snapshot");
    assert_eq!(synced.entity_count(), 3);

    let snapshot = content.load().await.unwrap().unwrap();
    assert_eq!(snapshot.topics.len(), 2);
    assert_eq!(snapshot.quizzes.len(), 1);
    assert!(snapshot.last_sync_timestamp > 0);
}

#[tokio::test]
async fn offline_sync_fails_without_touching_the_store() {
    let remote = Arc::new(ScriptedRemote::serving(remote_snapshot()));
    let (coordinator, content) = coordinator_with(remote.clone(), false);

    let existing = remote_snapshot();
    content.replace(&existing).await.unwrap();

    let report = coordinator.sync_content().await;
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("No internet connection"));

    // The snapshot is byte-identical and the remote was never contacted.
    assert_eq!(content.load().await.unwrap().unwrap(), existing);
    assert_eq!(remote.fetch_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn remote_failure_reports_sync_failed_and_keeps_snapshot() {
    let remote = Arc::new(ScriptedRemote::failing());
    let (coordinator, content) = coordinator_with(remote, true);

    let existing = remote_snapshot();
    content.replace(&existing).await.unwrap();

    let report = coordinator.sync_content().await;
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("Sync failed"));
    assert_eq!(content.load().await.unwrap().unwrap(), existing);
}

#[tokio::test]
async fn concurrent_sync_is_rejected_not_queued() {
    let gate = Arc::new(Notify::new());
    let remote = Arc::new(ScriptedRemote::gated(remote_snapshot(), gate.clone()));
    let (coordinator, _content) = coordinator_with(remote.clone(), true);
    let coordinator = Arc::new(coordinator);

    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.sync_content().await })
    };

    // Wait until the first sync is inside the remote fetch.
    while remote.fetch_count.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let second = coordinator.sync_content().await;
    assert!(!second.success);
    assert_eq!(second.error.as_deref(), Some("Sync already in progress"));

    gate.notify_one();
    let first = first.await.unwrap();
    assert!(first.success);

    // The guard is released: a follow-up sync succeeds again.
    gate.notify_one();
    assert!(coordinator.sync_content().await.success);
}

#[tokio::test]
async fn merge_keeps_local_only_entities() {
    let remote = Arc::new(ScriptedRemote::serving(SyncableContent {
        topics: vec![Entity::bare("topic-remote")],
        ..Default::default()
    }));
    let (coordinator, content) = coordinator_with(remote, true);

    content
        .replace(&SyncableContent {
            topics: vec![Entity::bare("topic-local")],
            last_sync_timestamp: 10,
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(coordinator.sync_content().await.success);

    let snapshot = content.load().await.unwrap().unwrap();
    let ids: Vec<&str> = snapshot.topics.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["topic-local", "topic-remote"]);
}

#[tokio::test]
async fn offline_content_accessors() {
    let remote = Arc::new(ScriptedRemote::serving(remote_snapshot()));
    let (coordinator, _content) = coordinator_with(remote, true);

    assert!(!coordinator.is_content_available_offline().await.unwrap());
    match coordinator.offline_content(ContentSection::Topics).await {
        Err(Error::NoOfflineContent) => {}
        other => panic!("expected NoOfflineContent, got {:?}", other),
    }

    assert!(coordinator.sync_content().await.success);
    assert!(coordinator.is_content_available_offline().await.unwrap());
    let topics = coordinator
        .offline_content(ContentSection::Topics)
        .await
        .unwrap();
    assert_eq!(topics.len(), 2);

    coordinator.clear_local_content().await.unwrap();
    assert!(!coordinator.is_content_available_offline().await.unwrap());
}

#[tokio::test]
async fn events_are_emitted_in_order() {
    let remote = Arc::new(ScriptedRemote::serving(remote_snapshot()));
    let (coordinator, _content) = coordinator_with(remote, true);

    let mut events = coordinator.events();
    assert!(coordinator.sync_content().await.success);

    assert!(matches!(events.recv().await.unwrap(), SyncEvent::SyncStarted));
    match events.recv().await.unwrap() {
        SyncEvent::SyncCompleted { entity_count } => assert_eq!(entity_count, 3),
        other => panic!("expected SyncCompleted, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_sync_emits_failure_event() {
    let remote = Arc::new(ScriptedRemote::failing());
    let (coordinator, _content) = coordinator_with(remote, true);

    let mut events = coordinator.events();
    assert!(!coordinator.sync_content().await.success);

    assert!(matches!(events.recv().await.unwrap(), SyncEvent::SyncStarted));
    match events.recv().await.unwrap() {
        SyncEvent::SyncFailed { error } => assert_eq!(error, "Sync failed"),
        other => panic!("expected SyncFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn background_loop_runs_initial_sync_and_shuts_down() {
    let remote = Arc::new(ScriptedRemote::serving(remote_snapshot()));
    let storage = Arc::new(MemoryStorage::new());
    let content = LocalContentStore::new(storage);
    let coordinator = SyncCoordinator::new(
        content.clone(),
        remote,
        Arc::new(StaticConnectivity(true)),
        SyncConfig::default().with_interval_secs(3600),
    );

    let handle = coordinator.start();
    let mut events = handle.events();

    // CoordinatorStarted, then the initial SyncStarted/SyncCompleted pair.
    assert!(matches!(
        events.recv().await.unwrap(),
        SyncEvent::CoordinatorStarted
    ));
    assert!(matches!(events.recv().await.unwrap(), SyncEvent::SyncStarted));
    assert!(matches!(
        events.recv().await.unwrap(),
        SyncEvent::SyncCompleted { .. }
    ));

    assert!(content.is_available().await.unwrap());

    handle.shutdown().await.unwrap();
    assert!(matches!(
        events.recv().await.unwrap(),
        SyncEvent::CoordinatorStopped
    ));
}
