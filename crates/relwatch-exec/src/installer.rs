//! Command-driven install executor

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relwatch_core::{ArtifactFetcher, ArtifactRef, InstallError, InstallExecutor};
use tracing::{info, warn};

use crate::config::InstallConfig;
use crate::error::ExecError;
use crate::local::LocalRunner;

/// Downloads the artifact to a staging directory and runs an apply command
///
/// The staged file is removed once the apply command has finished.
pub struct CommandInstaller {
    fetcher: Arc<dyn ArtifactFetcher>,
    runner: LocalRunner,
    staging_dir: PathBuf,
    apply_command: String,
    timeout: Option<Duration>,
}

impl CommandInstaller {
    pub fn new(fetcher: Arc<dyn ArtifactFetcher>, config: &InstallConfig) -> Self {
        Self {
            fetcher,
            runner: LocalRunner::new(),
            staging_dir: config.staging_dir.clone(),
            apply_command: config.apply_command.clone(),
            timeout: config.timeout(),
        }
    }

    /// Staging path for `artifact`, rejecting names that escape the directory
    fn staging_path(&self, artifact: &ArtifactRef) -> Result<PathBuf, InstallError> {
        let name = Path::new(&artifact.name);
        match name.file_name() {
            Some(file) if file == name.as_os_str() => Ok(self.staging_dir.join(file)),
            _ => Err(InstallError::Io(format!(
                "refusing artifact name {:?}",
                artifact.name
            ))),
        }
    }

    async fn stage(&self, artifact: &ArtifactRef, dest: &Path) -> Result<(), InstallError> {
        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|e| InstallError::Io(e.to_string()))?;

        let written = self.fetcher.fetch(artifact, dest).await?;
        if written != artifact.size {
            return Err(InstallError::SizeMismatch {
                expected: artifact.size,
                actual: written,
            });
        }

        info!(artifact = %artifact.name, bytes = written, "artifact staged");
        Ok(())
    }

    async fn apply(&self, artifact: &ArtifactRef, dest: &Path) -> Result<(), InstallError> {
        let env = [
            ("RELWATCH_ARTIFACT_PATH", dest.display().to_string()),
            ("RELWATCH_ARTIFACT_NAME", artifact.name.clone()),
            ("RELWATCH_ARTIFACT_SIZE", artifact.size.to_string()),
        ];

        let result = match self.timeout {
            Some(limit) => {
                self.runner
                    .run_with_timeout(&self.apply_command, &env, limit)
                    .await?
            }
            None => self.runner.run(&self.apply_command, &env).await?,
        };

        if !result.success() {
            return Err(ExecError::CommandFailed {
                status: result.status,
                stderr: result.stderr.trim().to_string(),
            }
            .into());
        }

        info!(
            artifact = %artifact.name,
            duration = ?result.duration,
            "apply command completed"
        );
        Ok(())
    }
}

#[async_trait]
impl InstallExecutor for CommandInstaller {
    async fn install(&self, artifact: &ArtifactRef) -> Result<(), InstallError> {
        let dest = self.staging_path(artifact)?;

        let result = match self.stage(artifact, &dest).await {
            Ok(()) => self.apply(artifact, &dest).await,
            Err(e) => Err(e),
        };

        if let Err(e) = tokio::fs::remove_file(&dest).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %dest.display(), error = %e, "failed to remove staged artifact");
        }

        result
    }

    fn executor_type(&self) -> &'static str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use relwatch_core::SourceError;

    use super::*;

    /// Writes a fixed payload instead of downloading
    struct StaticFetcher {
        payload: Vec<u8>,
    }

    #[async_trait]
    impl ArtifactFetcher for StaticFetcher {
        async fn fetch(&self, _artifact: &ArtifactRef, dest: &Path) -> Result<u64, SourceError> {
            tokio::fs::write(dest, &self.payload)
                .await
                .map_err(|e| SourceError::Download(e.to_string()))?;
            Ok(self.payload.len() as u64)
        }
    }

    fn artifact(size: u64) -> ArtifactRef {
        ArtifactRef {
            name: "evcc_0.2.0.rootfs.gz".to_string(),
            id: 7,
            size,
        }
    }

    fn installer(staging: &Path, apply_command: &str, payload: &[u8]) -> CommandInstaller {
        let config = InstallConfig {
            staging_dir: staging.to_path_buf(),
            apply_command: apply_command.to_string(),
            ..InstallConfig::default()
        };
        CommandInstaller::new(
            Arc::new(StaticFetcher {
                payload: payload.to_vec(),
            }),
            &config,
        )
    }

    #[tokio::test]
    async fn test_apply_receives_staged_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("applied");
        let command = format!(
            "cp \"$RELWATCH_ARTIFACT_PATH\" {} && test \"$RELWATCH_ARTIFACT_SIZE\" = 5",
            marker.display()
        );
        let installer = installer(&dir.path().join("staging"), &command, b"image");

        installer.install(&artifact(5)).await.unwrap();

        assert_eq!(std::fs::read(&marker).unwrap(), b"image");
        // Staged copy is cleaned up
        assert!(!dir.path().join("staging/evcc_0.2.0.rootfs.gz").exists());
    }

    #[tokio::test]
    async fn test_size_mismatch_skips_apply() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("applied");
        let command = format!("touch {}", marker.display());
        let installer = installer(dir.path(), &command, b"short");

        let err = installer.install(&artifact(1024)).await.unwrap_err();

        assert!(matches!(
            err,
            InstallError::SizeMismatch {
                expected: 1024,
                actual: 5
            }
        ));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_failing_apply_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let installer = installer(dir.path(), "echo 'no space left' >&2; exit 3", b"image");

        let err = installer.install(&artifact(5)).await.unwrap_err();

        match err {
            InstallError::Apply(message) => assert!(message.contains("no space left")),
            other => panic!("Expected Apply, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_path_in_artifact_name() {
        let dir = tempfile::tempdir().unwrap();
        let installer = installer(dir.path(), "true", b"image");
        let artifact = ArtifactRef {
            name: "../escape.rootfs.gz".to_string(),
            id: 1,
            size: 5,
        };

        let err = installer.install(&artifact).await.unwrap_err();
        assert!(matches!(err, InstallError::Io(_)));
    }
}
