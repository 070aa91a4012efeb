//! relwatch-exec: Artifact installation
//!
//! Provides the command-driven `InstallExecutor`: fetch the artifact into a
//! staging directory, then hand it to a configured apply command.

pub mod config;
pub mod error;
pub mod installer;
pub mod local;
pub mod result;

pub use config::InstallConfig;
pub use error::ExecError;
pub use installer::CommandInstaller;
pub use local::LocalRunner;
pub use result::CommandResult;
