//! GitHub REST API payloads

use chrono::{DateTime, Utc};
use relwatch_core::{Release, ReleaseAsset};
use serde::Deserialize;

/// Release as returned by `GET /repos/{owner}/{repo}/releases`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubRelease {
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

/// Release asset
#[derive(Debug, Clone, Deserialize)]
pub struct GithubAsset {
    pub id: u64,
    pub name: String,
    pub size: u64,
}

impl From<GithubRelease> for Release {
    fn from(release: GithubRelease) -> Self {
        Self {
            tag: release.tag_name,
            name: release.name.filter(|n| !n.is_empty()),
            notes: release.body.filter(|b| !b.is_empty()),
            prerelease: release.prerelease,
            draft: release.draft,
            published_at: release.published_at,
            assets: release
                .assets
                .into_iter()
                .map(|a| ReleaseAsset::new(a.name, a.id, a.size))
                .collect(),
        }
    }
}

/// Error body returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct GithubErrorBody {
    pub message: String,
}
