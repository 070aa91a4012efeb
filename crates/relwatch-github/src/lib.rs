//! relwatch-github: GitHub Releases backend
//!
//! Implements `ReleaseSource` and `ArtifactFetcher` on top of the GitHub REST
//! API.
//!
//! # Example
//!
//! ```no_run
//! use relwatch_core::ReleaseSource;
//! use relwatch_github::{GithubReleaseSource, RegistryConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RegistryConfig::new("evcc-io", "evcc");
//! let source = GithubReleaseSource::new(&config)?;
//!
//! for release in source.list_releases().await? {
//!     println!("{}", release.tag);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::GithubReleaseSource;
pub use config::RegistryConfig;
pub use error::{GithubError, Result};
