//! `ReleaseWatcher`: periodic registry polling
//!
//! Polls the release source on a fixed interval and notifies when a release
//! strictly newer than both the running version and the last notified
//! release appears.

use std::sync::Arc;
use std::time::Duration;

use semver::Version;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::WatcherConfig;
use crate::error::{CoreError, SourceError};
use crate::release::{Release, parse_version};
use crate::traits::ReleaseSource;

/// Background poller for new releases
pub struct ReleaseWatcher {
    source: Arc<dyn ReleaseSource>,
    current: Version,
    poll_interval: Duration,
    include_prereleases: bool,
    last_notified: Option<Version>,
}

impl ReleaseWatcher {
    /// Create a watcher for the running version in `config`
    ///
    /// # Errors
    /// Returns `CoreError::InvalidVersion` if the running version is not semver
    pub fn new(source: Arc<dyn ReleaseSource>, config: &WatcherConfig) -> Result<Self, CoreError> {
        let current = parse_version(&config.current_version)?;

        Ok(Self {
            source,
            current,
            poll_interval: config.poll_interval(),
            include_prereleases: config.include_prereleases,
            last_notified: None,
        })
    }

    /// Version of the running software
    #[must_use]
    pub fn current_version(&self) -> &Version {
        &self.current
    }

    /// Poll the source once
    ///
    /// Returns the release to notify, if any. A returned release is
    /// remembered so the same or an older one is never returned again.
    ///
    /// # Errors
    /// Returns the source error if listing releases fails
    pub async fn check_once(&mut self) -> Result<Option<Release>, SourceError> {
        let releases = self.source.list_releases().await?;

        let Some((version, release)) = self.newest(releases) else {
            debug!("no candidate releases found");
            return Ok(None);
        };

        if version <= self.current {
            debug!(installed = %self.current, latest = %version, "running latest version");
            return Ok(None);
        }

        if self
            .last_notified
            .as_ref()
            .is_some_and(|seen| version <= *seen)
        {
            return Ok(None);
        }

        self.last_notified = Some(version);
        Ok(Some(release))
    }

    /// Newest eligible release by semantic version
    fn newest(&self, releases: Vec<Release>) -> Option<(Version, Release)> {
        releases
            .into_iter()
            .filter(|r| !r.draft)
            .filter(|r| self.include_prereleases || !r.prerelease)
            .filter_map(|r| match r.version() {
                Some(v) => Some((v, r)),
                None => {
                    debug!(tag = %r.tag, "skipping release with non-semver tag");
                    None
                }
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
    }

    /// Run the polling loop until `cancel` fires or the receiver is dropped
    ///
    /// The first check happens immediately. Source errors are logged and
    /// retried on the next tick.
    pub async fn run(mut self, notify: mpsc::Sender<Release>, cancel: CancellationToken) {
        info!(
            installed = %self.current,
            interval = ?self.poll_interval,
            source = self.source.source_type(),
            "release watcher started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                () = cancel.cancelled() => break,
                result = self.check_once() => result,
            };

            match result {
                Ok(Some(release)) => {
                    info!(tag = %release.tag, "new version available");
                    let sent = tokio::select! {
                        () = cancel.cancelled() => break,
                        sent = notify.send(release) => sent,
                    };
                    if sent.is_err() {
                        warn!("release notification channel closed");
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(
                        installed = %self.current,
                        retryable = e.is_retryable(),
                        error = %e,
                        "version check failed"
                    );
                }
            }
        }

        info!("release watcher stopped");
    }
}
