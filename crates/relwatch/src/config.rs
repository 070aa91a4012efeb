//! Configuration loading and types

use std::path::{Path, PathBuf};

use relwatch_core::WatcherConfig;
use relwatch_exec::InstallConfig;
use relwatch_github::RegistryConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the relwatch daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Daemon server settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Release polling settings
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// Release registry
    #[serde(default = "default_registry")]
    pub registry: RegistryConfig,
    /// Artifact installation
    #[serde(default)]
    pub install: InstallConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon: DaemonConfig::default(),
            watcher: WatcherConfig::default(),
            registry: default_registry(),
            install: InstallConfig::default(),
        }
    }
}

fn default_registry() -> RegistryConfig {
    RegistryConfig::new("mozart409", "relwatch")
}

/// Daemon server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address and port to bind to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7070".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Locate a config file: `RELWATCH_CONFIG`, then common paths
    pub fn find_default() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("RELWATCH_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let mut paths = vec![
            PathBuf::from("relwatch.toml"),
            PathBuf::from("/etc/relwatch/relwatch.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("relwatch/relwatch.toml"));
        }

        paths.into_iter().find(|p| p.exists())
    }
}
