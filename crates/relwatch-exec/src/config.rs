//! Install settings

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How artifacts are staged and applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Artifact name prefix (`<product>_<tag>.rootfs.gz`)
    #[serde(default = "default_product")]
    pub product: String,
    /// Directory the artifact is downloaded into
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Shell command that applies the staged artifact
    ///
    /// Runs with `RELWATCH_ARTIFACT_PATH`, `RELWATCH_ARTIFACT_NAME` and
    /// `RELWATCH_ARTIFACT_SIZE` set.
    #[serde(default = "default_apply_command")]
    pub apply_command: String,
    /// Upper bound for the apply command
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            product: default_product(),
            staging_dir: default_staging_dir(),
            apply_command: default_apply_command(),
            timeout_secs: None,
        }
    }
}

fn default_product() -> String {
    "relwatch".to_string()
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("relwatch")
}

fn default_apply_command() -> String {
    "gzip -t \"$RELWATCH_ARTIFACT_PATH\"".to_string()
}

impl InstallConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
