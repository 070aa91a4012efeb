//! Collaborator traits

use std::path::Path;

use async_trait::async_trait;
use relwatch_api::events::StateEvent;

use crate::error::{InstallError, SourceError};
use crate::release::{ArtifactRef, Release};

/// Release registry
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// List all releases visible in the registry
    async fn list_releases(&self) -> Result<Vec<Release>, SourceError>;

    /// Resolve an artifact by name within the release tagged `tag`
    async fn resolve_artifact(&self, tag: &str, name: &str) -> Result<ArtifactRef, SourceError>;

    fn source_type(&self) -> &'static str;
}

/// Downloads artifacts to the local filesystem
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Write the artifact to `dest`, returning the number of bytes written
    async fn fetch(&self, artifact: &ArtifactRef, dest: &Path) -> Result<u64, SourceError>;
}

/// Applies an artifact to the running host
#[async_trait]
pub trait InstallExecutor: Send + Sync {
    async fn install(&self, artifact: &ArtifactRef) -> Result<(), InstallError>;

    fn executor_type(&self) -> &'static str;
}

/// Receives published state events
///
/// Publishing is fire-and-forget.
pub trait StateSink: Send + Sync {
    fn publish(&self, event: StateEvent);
}
