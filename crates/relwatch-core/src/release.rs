//! Release and artifact types

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Suffix of root filesystem image artifacts
pub const ROOTFS_ARTIFACT_SUFFIX: &str = ".rootfs.gz";

/// A published release as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Version tag (e.g. `0.132.1` or `v0.132.1`)
    pub tag: String,
    /// Display name
    pub name: Option<String>,
    /// Release notes
    pub notes: Option<String>,
    /// Marked as prerelease
    #[serde(default)]
    pub prerelease: bool,
    /// Not yet published
    #[serde(default)]
    pub draft: bool,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Downloadable artifacts
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Create a published, non-prerelease release with no assets
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            name: None,
            notes: None,
            prerelease: false,
            draft: false,
            published_at: None,
            assets: Vec::new(),
        }
    }

    /// Attach an asset
    #[must_use]
    pub fn with_asset(mut self, asset: ReleaseAsset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Set release notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Mark as prerelease
    #[must_use]
    pub fn prerelease(mut self) -> Self {
        self.prerelease = true;
        self
    }

    /// Parsed semantic version of the tag, if it is one
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        parse_version(&self.tag).ok()
    }

    /// Find asset by exact name
    #[must_use]
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// A downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// File name
    pub name: String,
    /// Registry identifier
    pub id: u64,
    /// Size in bytes
    pub size: u64,
}

impl ReleaseAsset {
    pub fn new(name: impl Into<String>, id: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            id,
            size,
        }
    }
}

/// Artifact resolved for one install attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// File name
    pub name: String,
    /// Registry identifier used to fetch it
    pub id: u64,
    /// Expected size in bytes
    pub size: u64,
}

impl From<&ReleaseAsset> for ArtifactRef {
    fn from(asset: &ReleaseAsset) -> Self {
        Self {
            name: asset.name.clone(),
            id: asset.id,
            size: asset.size,
        }
    }
}

/// Parse a version tag, accepting an optional leading `v`
///
/// # Errors
/// Returns `CoreError::InvalidVersion` if the tag is not a semantic version
pub fn parse_version(tag: &str) -> Result<Version, CoreError> {
    let trimmed = tag.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).map_err(|e| CoreError::InvalidVersion {
        version: tag.to_string(),
        reason: e.to_string(),
    })
}

/// Name of the root filesystem image for `tag`
#[must_use]
pub fn rootfs_artifact_name(product: &str, tag: &str) -> String {
    format!("{product}_{tag}{ROOTFS_ARTIFACT_SUFFIX}")
}
