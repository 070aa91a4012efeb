//! `ReleaseStateActor`: owner of the latest known release
//!
//! All reads and writes of the latest release go through this actor's
//! mailbox. On start it announces the update capability to the state sink.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use relwatch_api::events::StateEvent;
use semver::Version;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::message::{GetLatestRelease, ReleaseObserved, ReleaseSnapshot};
use crate::release::Release;
use crate::traits::StateSink;

/// Arguments for spawning a `ReleaseStateActor`
pub struct ReleaseStateActorArgs {
    /// Where state events are published
    pub sink: Arc<dyn StateSink>,
}

/// Holds the newest release reported by the watcher
pub struct ReleaseStateActor {
    latest: Option<Release>,
    /// Parsed version of `latest`, if its tag is semver
    latest_version: Option<Version>,
    observed_at: Option<DateTime<Utc>>,
    sink: Arc<dyn StateSink>,
}

impl ReleaseStateActor {
    /// Whether `release` may replace the current latest release
    fn supersedes(&self, release: &Release) -> bool {
        let Some(current) = &self.latest else {
            return true;
        };
        match (&self.latest_version, release.version()) {
            (Some(current_version), Some(offered)) => offered > *current_version,
            _ => current.tag != release.tag,
        }
    }
}

impl Actor for ReleaseStateActor {
    type Args = ReleaseStateActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(id = %actor_ref.id(), "ReleaseStateActor starting");

        args.sink.publish(StateEvent::HasUpdater(true));

        Ok(Self {
            latest: None,
            latest_version: None,
            observed_at: None,
            sink: args.sink,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, "ReleaseStateActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<ReleaseObserved> for ReleaseStateActor {
    type Reply = Result<(), CoreError>;

    async fn handle(
        &mut self,
        msg: ReleaseObserved,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let release = msg.release;

        if !self.supersedes(&release) {
            let current = self
                .latest
                .as_ref()
                .map(|r| r.tag.clone())
                .unwrap_or_default();
            debug!(current = %current, offered = %release.tag, "ignoring stale release");
            return Err(CoreError::StaleRelease {
                current,
                offered: release.tag,
            });
        }

        info!(tag = %release.tag, "recorded latest release");

        self.sink
            .publish(StateEvent::AvailableVersion(release.tag.clone()));
        if let Some(notes) = release.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            self.sink.publish(StateEvent::ReleaseNotes(notes.to_string()));
        }

        self.latest_version = release.version();
        self.latest = Some(release);
        self.observed_at = Some(Utc::now());

        Ok(())
    }
}

impl Message<GetLatestRelease> for ReleaseStateActor {
    type Reply = ReleaseSnapshot;

    async fn handle(
        &mut self,
        _msg: GetLatestRelease,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        ReleaseSnapshot {
            release: self.latest.clone(),
            observed_at: self.observed_at,
        }
    }
}
