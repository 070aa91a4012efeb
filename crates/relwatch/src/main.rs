//! relwatch daemon
//!
//! Watches a release registry for newer versions of the running product and
//! installs the latest root filesystem image on request over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use relwatch_api::events::StateEvent;
use relwatch_core::BroadcastSink;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod factory;
mod router;
mod state;

use config::{Config, LogFormat};
use state::AppState;

/// Self-update watcher daemon
#[derive(Parser, Debug)]
#[command(name = "relwatch", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config_path = args.config.or_else(Config::find_default);
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    init_tracing(&config);

    match &config_path {
        Some(path) => tracing::info!(path = %path.display(), "loaded configuration"),
        None => tracing::info!("no configuration file found, using defaults"),
    }
    tracing::info!(
        version = %config.watcher.current_version,
        "relwatch daemon starting"
    );

    let cancel = CancellationToken::new();

    // Subscribe before the coordinator starts so `hasUpdater` is not missed
    let sink = Arc::new(BroadcastSink::new(32));
    let event_logger = tokio::spawn(log_state_events(sink.subscribe(), cancel.clone()));

    let services = factory::build_services(&config, sink)?;
    let coordinator = services.coordinator;

    let (tx, rx) = mpsc::channel(1);
    let notifier = coordinator.spawn_notification_loop(rx, cancel.clone());
    let watcher = tokio::spawn(services.watcher.run(tx, cancel.clone()));

    let bind = config.daemon.bind.clone();
    let state = Arc::new(AppState::new(coordinator.clone(), config));
    let app = router::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(address = %bind, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    tracing::info!("shutting down");
    cancel.cancel();
    tokio::join!(
        join_task("release watcher", watcher),
        join_task("notification loop", notifier),
        join_task("state event logger", event_logger),
    );
    coordinator.stop().await;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.daemon.log_level));
    let json = config.daemon.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Log every published state event until cancelled
async fn log_state_events(mut rx: broadcast::Receiver<StateEvent>, cancel: CancellationToken) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            event = rx.recv() => event,
        };

        match event {
            Ok(StateEvent::HasUpdater(enabled)) => {
                tracing::info!(key = "hasUpdater", enabled, "state published");
            }
            Ok(StateEvent::AvailableVersion(version)) => {
                tracing::info!(key = "availableVersion", %version, "state published");
            }
            Ok(StateEvent::ReleaseNotes(notes)) => {
                tracing::info!(key = "releaseNotes", len = notes.len(), "state published");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "state event logger lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Wait for a background task, returning false if it panicked or was aborted
async fn join_task(name: &'static str, handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(task = name, error = %e, "background task did not exit cleanly");
            false
        }
    }
}

/// Resolve on Ctrl+C, SIGTERM or cancellation
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
        () = cancel.cancelled() => {}
    }
}
