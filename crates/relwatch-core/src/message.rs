//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use chrono::{DateTime, Utc};
use kameo_macros::Reply;

use crate::release::Release;

/// The watcher reported a newer release
#[derive(Debug)]
pub struct ReleaseObserved {
    pub release: Release,
}

/// Read the latest known release
#[derive(Debug)]
pub struct GetLatestRelease;

/// Point-in-time view of the latest known release
#[derive(Debug, Clone, Default, Reply)]
pub struct ReleaseSnapshot {
    /// Newest release observed so far
    pub release: Option<Release>,
    /// When it was recorded
    pub observed_at: Option<DateTime<Utc>>,
}
