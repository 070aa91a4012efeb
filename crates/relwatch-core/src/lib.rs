//! relwatch-core: Release watching and update coordination
//!
//! Implements the `ReleaseWatcher` polling loop, the `ReleaseStateActor` that
//! owns the latest known release, and the `UpdateCoordinator` install
//! workflow. Collaborators (registry, installer, state sink) are traits.

pub mod actor;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod message;
pub mod release;
pub mod sink;
pub mod traits;
pub mod watcher;

pub use actor::{ReleaseStateActor, ReleaseStateActorArgs};
pub use config::WatcherConfig;
pub use coordinator::{UpdateCoordinator, UpdateCoordinatorArgs};
pub use error::{CoreError, InstallError, SourceError, UpdateError};
pub use message::{GetLatestRelease, ReleaseObserved, ReleaseSnapshot};
pub use release::{ArtifactRef, Release, ReleaseAsset, parse_version, rootfs_artifact_name};
pub use sink::BroadcastSink;
pub use traits::{ArtifactFetcher, InstallExecutor, ReleaseSource, StateSink};
pub use watcher::ReleaseWatcher;
