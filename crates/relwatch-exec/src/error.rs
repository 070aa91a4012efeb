//! Error types for relwatch-exec

use std::time::Duration;

use relwatch_core::InstallError;
use thiserror::Error;

/// Errors that can occur while running the apply command
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Command exited unsuccessfully
    #[error("command failed: {status} - {stderr}")]
    CommandFailed {
        /// Exit status code
        status: i32,
        /// Stderr output
        stderr: String,
    },

    /// Command timed out
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error during execution
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<ExecError> for InstallError {
    fn from(err: ExecError) -> Self {
        InstallError::Apply(err.to_string())
    }
}
