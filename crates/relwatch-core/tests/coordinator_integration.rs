use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

use relwatch_api::events::StateEvent;
use relwatch_core::*;

// Mock implementations
#[derive(Default)]
struct MockSource {
    releases: Mutex<Vec<Release>>,
    /// (tag, artifact name) -> artifact
    artifacts: HashMap<(String, String), ArtifactRef>,
    list_calls: AtomicUsize,
    /// Number of upcoming polls that fail
    failing_polls: AtomicUsize,
}

impl MockSource {
    fn with_artifact(mut self, tag: &str, artifact: ArtifactRef) -> Self {
        self.artifacts
            .insert((tag.to_string(), artifact.name.clone()), artifact);
        self
    }
}

#[async_trait]
impl ReleaseSource for MockSource {
    async fn list_releases(&self) -> Result<Vec<Release>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SourceError::Unavailable("connection refused".to_string()));
        }
        Ok(self.releases.lock().unwrap().clone())
    }

    async fn resolve_artifact(&self, tag: &str, name: &str) -> Result<ArtifactRef, SourceError> {
        self.artifacts
            .get(&(tag.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| SourceError::ArtifactNotFound {
                tag: tag.to_string(),
                name: name.to_string(),
            })
    }

    fn source_type(&self) -> &'static str {
        "mock"
    }
}

#[derive(Default)]
struct MockExecutor {
    installed: Mutex<Vec<ArtifactRef>>,
    failure: Option<String>,
}

#[async_trait]
impl InstallExecutor for MockExecutor {
    async fn install(&self, artifact: &ArtifactRef) -> Result<(), InstallError> {
        self.installed.lock().unwrap().push(artifact.clone());
        match &self.failure {
            Some(reason) => Err(InstallError::Apply(reason.clone())),
            None => Ok(()),
        }
    }

    fn executor_type(&self) -> &'static str {
        "mock"
    }
}

/// Blocks inside `install` until released
#[derive(Default)]
struct GatedExecutor {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

#[async_trait]
impl InstallExecutor for GatedExecutor {
    async fn install(&self, _artifact: &ArtifactRef) -> Result<(), InstallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn executor_type(&self) -> &'static str {
        "gated"
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<StateEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<StateEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl StateSink for RecordingSink {
    fn publish(&self, event: StateEvent) {
        self.events.lock().unwrap().push(event);
    }
}

const PRODUCT: &str = "relwatch";

fn rootfs(tag: &str, id: u64, size: u64) -> ArtifactRef {
    ArtifactRef {
        name: rootfs_artifact_name(PRODUCT, tag),
        id,
        size,
    }
}

fn coordinator(
    source: Arc<dyn ReleaseSource>,
    executor: Arc<dyn InstallExecutor>,
    sink: Arc<dyn StateSink>,
) -> UpdateCoordinator {
    UpdateCoordinator::spawn(UpdateCoordinatorArgs {
        source,
        executor,
        sink,
        product: PRODUCT.to_string(),
    })
}

#[tokio::test]
async fn test_has_updater_published_before_available_version() {
    let sink = Arc::new(RecordingSink::default());
    let coordinator = coordinator(
        Arc::new(MockSource::default()),
        Arc::new(MockExecutor::default()),
        sink.clone(),
    );

    // Round trip through the mailbox guarantees on_start has run
    let snapshot = coordinator.latest_release().await.unwrap();
    assert!(snapshot.release.is_none());
    assert_eq!(sink.events(), vec![StateEvent::HasUpdater(true)]);

    coordinator
        .record_release(Release::new("0.2.0"))
        .await
        .unwrap();

    assert_eq!(
        sink.events(),
        vec![
            StateEvent::HasUpdater(true),
            StateEvent::AvailableVersion("0.2.0".to_string()),
        ]
    );

    coordinator.stop().await;
}

#[tokio::test]
async fn test_release_notes_published() {
    let sink = Arc::new(RecordingSink::default());
    let coordinator = coordinator(
        Arc::new(MockSource::default()),
        Arc::new(MockExecutor::default()),
        sink.clone(),
    );

    coordinator
        .record_release(Release::new("0.2.0").with_notes("Fixes charging"))
        .await
        .unwrap();

    assert_eq!(
        sink.events().last(),
        Some(&StateEvent::ReleaseNotes("Fixes charging".to_string()))
    );

    coordinator.stop().await;
}

#[tokio::test]
async fn test_stale_release_does_not_replace_latest() {
    let sink = Arc::new(RecordingSink::default());
    let coordinator = coordinator(
        Arc::new(MockSource::default()),
        Arc::new(MockExecutor::default()),
        sink.clone(),
    );

    coordinator
        .record_release(Release::new("1.2.0"))
        .await
        .unwrap();
    let result = coordinator.record_release(Release::new("1.1.0")).await;
    assert!(matches!(result, Err(CoreError::StaleRelease { .. })));

    let result = coordinator.record_release(Release::new("1.2.0")).await;
    assert!(matches!(result, Err(CoreError::StaleRelease { .. })));

    let snapshot = coordinator.latest_release().await.unwrap();
    assert_eq!(snapshot.release.unwrap().tag, "1.2.0");
    assert!(snapshot.observed_at.is_some());
    assert_eq!(sink.events().len(), 2);

    coordinator.stop().await;
}

#[tokio::test]
async fn test_trigger_without_release_never_installs() {
    let executor = Arc::new(MockExecutor::default());
    let coordinator = coordinator(
        Arc::new(MockSource::default()),
        executor.clone(),
        Arc::new(RecordingSink::default()),
    );

    let result = coordinator.trigger_update().await;

    assert!(matches!(result, Err(UpdateError::NoRelease)));
    assert!(executor.installed.lock().unwrap().is_empty());

    coordinator.stop().await;
}

#[tokio::test]
async fn test_trigger_with_missing_artifact_never_installs() {
    let executor = Arc::new(MockExecutor::default());
    // Artifact exists only for a different tag
    let source = MockSource::default().with_artifact("0.1.0", rootfs("0.1.0", 1, 10));
    let coordinator = coordinator(
        Arc::new(source),
        executor.clone(),
        Arc::new(RecordingSink::default()),
    );
    coordinator
        .record_release(Release::new("0.2.0"))
        .await
        .unwrap();

    let err = coordinator.trigger_update().await.unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("relwatch_0.2.0.rootfs.gz"));
    assert!(executor.installed.lock().unwrap().is_empty());

    coordinator.stop().await;
}

#[tokio::test]
async fn test_trigger_installs_resolved_artifact_once() {
    let executor = Arc::new(MockExecutor::default());
    let source = MockSource::default().with_artifact("0.2.0", rootfs("0.2.0", 42, 123_456));
    let coordinator = coordinator(
        Arc::new(source),
        executor.clone(),
        Arc::new(RecordingSink::default()),
    );
    coordinator
        .record_release(Release::new("0.2.0"))
        .await
        .unwrap();

    let artifact = coordinator.trigger_update().await.unwrap();

    assert_eq!(artifact, rootfs("0.2.0", 42, 123_456));
    assert_eq!(
        *executor.installed.lock().unwrap(),
        vec![rootfs("0.2.0", 42, 123_456)]
    );

    coordinator.stop().await;
}

#[tokio::test]
async fn test_install_failure_is_reported() {
    let executor = Arc::new(MockExecutor {
        failure: Some("partition write failed".to_string()),
        ..MockExecutor::default()
    });
    let source = MockSource::default().with_artifact("0.2.0", rootfs("0.2.0", 42, 1));
    let coordinator = coordinator(
        Arc::new(source),
        executor.clone(),
        Arc::new(RecordingSink::default()),
    );
    coordinator
        .record_release(Release::new("0.2.0"))
        .await
        .unwrap();

    let err = coordinator.trigger_update().await.unwrap_err();

    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("partition write failed"));
    assert_eq!(executor.installed.lock().unwrap().len(), 1);

    // The slot is released after a failure
    let err = coordinator.trigger_update().await.unwrap_err();
    assert!(matches!(err, UpdateError::InstallFailed(_)));

    coordinator.stop().await;
}

#[tokio::test]
async fn test_concurrent_trigger_is_rejected() {
    let executor = Arc::new(GatedExecutor::default());
    let source = MockSource::default().with_artifact("0.2.0", rootfs("0.2.0", 42, 1));
    let coordinator = coordinator(
        Arc::new(source),
        executor.clone(),
        Arc::new(RecordingSink::default()),
    );
    coordinator
        .record_release(Release::new("0.2.0"))
        .await
        .unwrap();

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.trigger_update().await }
    });
    executor.started.notified().await;

    let second = coordinator.trigger_update().await;
    assert!(matches!(second, Err(UpdateError::InProgress)));
    assert_eq!(second.unwrap_err().status_code(), 409);

    executor.release.notify_one();
    assert!(first.await.unwrap().is_ok());
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);

    coordinator.stop().await;
}

#[tokio::test]
async fn test_install_survives_abandoned_trigger() {
    let executor = Arc::new(GatedExecutor::default());
    let source = MockSource::default().with_artifact("0.2.0", rootfs("0.2.0", 42, 1));
    let coordinator = coordinator(
        Arc::new(source),
        executor.clone(),
        Arc::new(RecordingSink::default()),
    );
    coordinator
        .record_release(Release::new("0.2.0"))
        .await
        .unwrap();

    let caller = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.trigger_update().await }
    });
    executor.started.notified().await;

    // Caller goes away mid-install
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    // The install still holds the slot
    let err = coordinator.trigger_update().await.unwrap_err();
    assert!(matches!(err, UpdateError::InProgress));

    executor.release.notify_one();
    while executor.completed.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    tokio::task::yield_now().await;

    // Slot is free again once the install finished
    executor.release.notify_one();
    coordinator.trigger_update().await.unwrap();
    assert_eq!(executor.calls.load(Ordering::SeqCst), 2);
    assert_eq!(executor.completed.load(Ordering::SeqCst), 2);

    coordinator.stop().await;
}

#[tokio::test]
async fn test_notification_loop_records_releases() {
    let sink = Arc::new(RecordingSink::default());
    let coordinator = coordinator(
        Arc::new(MockSource::default()),
        Arc::new(MockExecutor::default()),
        sink.clone(),
    );

    let (tx, rx) = mpsc::channel(1);
    let handle = coordinator.spawn_notification_loop(rx, CancellationToken::new());

    tx.send(Release::new("0.2.0")).await.unwrap();
    tx.send(Release::new("0.3.0")).await.unwrap();
    drop(tx);
    handle.await.unwrap();

    let snapshot = coordinator.latest_release().await.unwrap();
    assert_eq!(snapshot.release.unwrap().tag, "0.3.0");
    assert_eq!(
        sink.events(),
        vec![
            StateEvent::HasUpdater(true),
            StateEvent::AvailableVersion("0.2.0".to_string()),
            StateEvent::AvailableVersion("0.3.0".to_string()),
        ]
    );

    coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_watcher_loop_notifies_and_stops_on_cancel() {
    let source = Arc::new(MockSource::default());
    source.releases.lock().unwrap().push(Release::new("1.1.0"));

    let config = WatcherConfig {
        poll_interval_secs: 60,
        ..WatcherConfig::new("1.0.0")
    };
    let watcher = ReleaseWatcher::new(source.clone(), &config).unwrap();

    let (tx, mut rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(watcher.run(tx, cancel.clone()));

    // First check runs immediately
    assert_eq!(rx.recv().await.unwrap().tag, "1.1.0");

    // Same release on later polls is not notified again
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert!(rx.try_recv().is_err());
    assert!(source.list_calls.load(Ordering::SeqCst) >= 3);

    source.releases.lock().unwrap().push(Release::new("1.2.0"));
    assert_eq!(rx.recv().await.unwrap().tag, "1.2.0");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_watcher_loop_continues_after_source_error() {
    let source = Arc::new(MockSource::default());
    source.failing_polls.store(1, Ordering::SeqCst);
    source.releases.lock().unwrap().push(Release::new("1.1.0"));

    let config = WatcherConfig {
        poll_interval_secs: 60,
        ..WatcherConfig::new("1.0.0")
    };
    let watcher = ReleaseWatcher::new(source.clone(), &config).unwrap();

    let (tx, mut rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(watcher.run(tx, cancel.clone()));

    // First poll fails, the next tick delivers the release
    assert_eq!(rx.recv().await.unwrap().tag, "1.1.0");
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
    assert!(!handle.is_finished());

    cancel.cancel();
    handle.await.unwrap();
}
