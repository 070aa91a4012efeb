//! Wiring of release source, installer, watcher and coordinator

use std::sync::Arc;

use eyre::Result;
use relwatch_core::{
    BroadcastSink, ReleaseWatcher, StateSink, UpdateCoordinator, UpdateCoordinatorArgs,
};
use relwatch_exec::CommandInstaller;
use relwatch_github::GithubReleaseSource;

use crate::config::Config;

/// Background components built from configuration
pub struct Services {
    pub watcher: ReleaseWatcher,
    pub coordinator: UpdateCoordinator,
}

/// Build all services
///
/// Subscribe to `sink` before calling this to observe the startup event.
///
/// # Errors
/// Returns error if the registry settings or the running version are invalid
pub fn build_services(config: &Config, sink: Arc<BroadcastSink>) -> Result<Services> {
    let github = Arc::new(
        GithubReleaseSource::new(&config.registry)
            .map_err(|e| eyre::eyre!("failed to create release source: {e}"))?,
    );

    let watcher = ReleaseWatcher::new(github.clone(), &config.watcher)?;

    let installer = Arc::new(CommandInstaller::new(github.clone(), &config.install));
    let sink: Arc<dyn StateSink> = sink;

    let coordinator = UpdateCoordinator::spawn(UpdateCoordinatorArgs {
        source: github,
        executor: installer,
        sink,
        product: config.install.product.clone(),
    });

    tracing::info!(
        owner = %config.registry.owner,
        repository = %config.registry.repository,
        product = %config.install.product,
        "update services created"
    );

    Ok(Services {
        watcher,
        coordinator,
    })
}
