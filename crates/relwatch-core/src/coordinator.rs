//! `UpdateCoordinator`: latest-release state and the install workflow

use std::sync::Arc;

use kameo::actor::{ActorRef, Spawn};
use kameo::error::SendError;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::actor::release_state::{ReleaseStateActor, ReleaseStateActorArgs};
use crate::error::{CoreError, UpdateError};
use crate::message::{GetLatestRelease, ReleaseObserved, ReleaseSnapshot};
use crate::release::{ArtifactRef, Release, rootfs_artifact_name};
use crate::traits::{InstallExecutor, ReleaseSource, StateSink};

/// Arguments for creating an `UpdateCoordinator`
pub struct UpdateCoordinatorArgs {
    /// Registry used to resolve artifacts
    pub source: Arc<dyn ReleaseSource>,
    /// Installer invoked on trigger
    pub executor: Arc<dyn InstallExecutor>,
    /// Where state events are published
    pub sink: Arc<dyn StateSink>,
    /// Artifact name prefix
    pub product: String,
}

/// Bridges watcher notifications into published state and runs installs
///
/// Cloning is cheap; clones share the state actor and the install slot.
#[derive(Clone)]
pub struct UpdateCoordinator {
    state: ActorRef<ReleaseStateActor>,
    source: Arc<dyn ReleaseSource>,
    executor: Arc<dyn InstallExecutor>,
    product: Arc<str>,
    /// Held for the duration of one install
    install_slot: Arc<Mutex<()>>,
}

impl UpdateCoordinator {
    /// Spawn the state actor, which publishes `hasUpdater` on start
    #[must_use]
    pub fn spawn(args: UpdateCoordinatorArgs) -> Self {
        let state = ReleaseStateActor::spawn(ReleaseStateActorArgs { sink: args.sink });

        Self {
            state,
            source: args.source,
            executor: args.executor,
            product: args.product.into(),
            install_slot: Arc::new(Mutex::new(())),
        }
    }

    /// Drain watcher notifications into the state actor
    ///
    /// Stops when `cancel` fires or the sending side is dropped.
    pub fn spawn_notification_loop(
        &self,
        mut rx: mpsc::Receiver<Release>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let state = self.state.clone();

        tokio::spawn(async move {
            loop {
                let release = tokio::select! {
                    () = cancel.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(release) => release,
                        None => {
                            warn!("release notification channel closed");
                            break;
                        }
                    },
                };

                if let Err(e) = state.ask(ReleaseObserved { release }).await {
                    warn!(error = %e, "release notification not recorded");
                }
            }
        })
    }

    /// Current latest known release
    ///
    /// # Errors
    /// Returns `CoreError::ActorError` if the state actor is not running
    pub async fn latest_release(&self) -> Result<ReleaseSnapshot, CoreError> {
        self.state
            .ask(GetLatestRelease)
            .await
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    /// Record a release directly, bypassing the notification channel
    ///
    /// # Errors
    /// Returns `CoreError::StaleRelease` if it is not newer than the current one
    pub async fn record_release(&self, release: Release) -> Result<(), CoreError> {
        match self.state.ask(ReleaseObserved { release }).await {
            Ok(()) => Ok(()),
            Err(SendError::HandlerError(e)) => Err(e),
            Err(e) => Err(CoreError::ActorError(e.to_string())),
        }
    }

    /// Install the root filesystem image of the latest known release
    ///
    /// At most one install runs at a time; concurrent callers get
    /// `UpdateError::InProgress`. Once started, the install runs to
    /// completion on its own task and keeps the slot until it finishes,
    /// even if the caller stops waiting.
    ///
    /// # Errors
    /// Returns `UpdateError` describing why no install was performed or why it failed
    pub async fn trigger_update(&self) -> Result<ArtifactRef, UpdateError> {
        let Ok(slot) = Arc::clone(&self.install_slot).try_lock_owned() else {
            warn!("update requested while another is in progress");
            return Err(UpdateError::InProgress);
        };

        let snapshot = self
            .latest_release()
            .await
            .map_err(|e| UpdateError::Internal(e.to_string()))?;
        let release = snapshot.release.ok_or(UpdateError::NoRelease)?;

        let name = rootfs_artifact_name(&self.product, &release.tag);
        let artifact = self
            .source
            .resolve_artifact(&release.tag, &name)
            .await
            .map_err(UpdateError::ArtifactNotFound)?;

        info!(
            tag = %release.tag,
            artifact = %artifact.name,
            id = artifact.id,
            size = artifact.size,
            executor = self.executor.executor_type(),
            "starting update"
        );

        let executor = Arc::clone(&self.executor);
        let install = tokio::spawn(async move {
            let _slot = slot;
            let tag = release.tag;

            if let Err(e) = executor.install(&artifact).await {
                error!(tag = %tag, error = %e, "Update failed");
                return Err(UpdateError::InstallFailed(e));
            }

            info!(tag = %tag, "update installed");
            Ok(artifact)
        });

        install
            .await
            .map_err(|e| UpdateError::Internal(format!("install task failed: {e}")))?
    }

    /// Stop the state actor
    pub async fn stop(&self) {
        self.state.stop_gracefully().await.ok();
    }
}
