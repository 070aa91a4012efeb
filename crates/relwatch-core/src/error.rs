//! Core error types for relwatch-core

use thiserror::Error;

/// Errors that can occur in core operations
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Version string is not a semantic version
    #[error("invalid version {version:?}: {reason}")]
    InvalidVersion {
        /// Offending version string
        version: String,
        /// Parser message
        reason: String,
    },

    /// Release is not newer than the one already recorded
    #[error("release {offered} is not newer than {current}")]
    StaleRelease {
        /// Tag already recorded
        current: String,
        /// Tag that was offered
        offered: String,
    },

    /// Actor communication error
    #[error("actor communication error: {0}")]
    ActorError(String),
}

/// Errors reported by a release source
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// Registry could not be reached or returned a server error
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// Registry refused the request because of rate limiting
    #[error("rate limited by registry: {0}")]
    RateLimited(String),

    /// No release with this tag
    #[error("release not found: {0}")]
    ReleaseNotFound(String),

    /// Release exists but carries no artifact with this name
    #[error("asset {name} not found in release {tag}")]
    ArtifactNotFound {
        /// Release tag
        tag: String,
        /// Expected artifact name
        name: String,
    },

    /// Registry answered with something we could not interpret
    #[error("invalid registry response: {0}")]
    InvalidResponse(String),

    /// Artifact download failed
    #[error("download failed: {0}")]
    Download(String),
}

impl SourceError {
    /// Check if error is transient
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Unavailable(_) | SourceError::RateLimited(_)
        )
    }
}

/// Errors reported by an install executor
#[derive(Error, Debug, Clone)]
pub enum InstallError {
    /// Fetching the artifact failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] SourceError),

    /// Downloaded artifact does not have the advertised size
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Size advertised by the registry
        expected: u64,
        /// Bytes actually written
        actual: u64,
    },

    /// Applying the artifact to the host failed
    #[error("apply failed: {0}")]
    Apply(String),

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

/// Outcome of a rejected or failed update trigger
///
/// The `Display` output is the message returned to HTTP callers.
#[derive(Error, Debug, Clone)]
pub enum UpdateError {
    /// Another install currently holds the install slot
    #[error("Update already in progress")]
    InProgress,

    /// The watcher has not reported any release yet
    #[error("No release available for update")]
    NoRelease,

    /// Artifact could not be resolved in the latest release
    #[error("RootFS image not found: {0}")]
    ArtifactNotFound(SourceError),

    /// Install executor failed
    #[error("Update failed: {0}")]
    InstallFailed(InstallError),

    /// Internal failure (actor unavailable)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl UpdateError {
    /// HTTP status code for this outcome
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            UpdateError::NoRelease | UpdateError::ArtifactNotFound(_) => 400,
            UpdateError::InProgress => 409,
            UpdateError::InstallFailed(_) | UpdateError::Internal(_) => 500,
        }
    }
}
