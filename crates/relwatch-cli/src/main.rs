//! relwatch CLI
//!
//! Command-line interface for querying the relwatch daemon and triggering updates

use clap::{Parser, Subcommand};
use color_eyre::Result;

mod client;

use client::{ClientError, DaemonClient};

#[derive(Parser)]
#[command(name = "relwatch-cli")]
#[command(about = "Query the relwatch daemon and trigger updates", long_about = None)]
struct Cli {
    /// Daemon base URL
    #[arg(long, default_value = "http://127.0.0.1:7070")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check daemon health
    Health,
    /// Show the latest release known to the daemon
    Status,
    /// Install the latest release
    Update,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = DaemonClient::new(&cli.server)?;
    tracing::debug!(server = %cli.server, "connecting to daemon");

    match cli.command {
        Commands::Health => {
            let health = client.health().await?;
            println!("{}", health.status);
        }
        Commands::Status => {
            let release = client.latest_release().await?;
            println!("running:   {}", release.current_version);
            match release.tag {
                Some(tag) if release.available => {
                    println!("available: {tag}");
                    if let Some(published) = release.published_at {
                        println!("published: {published}");
                    }
                    if let Some(notes) = release.notes {
                        println!("\n{notes}");
                    }
                }
                _ => println!("available: none"),
            }
        }
        Commands::Update => match client.trigger_update().await {
            Ok(message) => println!("{message}"),
            Err(ClientError::Api { status, message }) => {
                eprintln!("{message} ({status})");
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}
