//! HTTP client for the relwatch daemon

use relwatch_api::responses::{HealthResponse, LatestReleaseResponse};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Daemon answered with a non-success status
    #[error("daemon returned {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Thin wrapper over the daemon's HTTP API
#[derive(Debug, Clone)]
pub struct DaemonClient {
    client: Client,
    base_url: Url,
}

impl DaemonClient {
    /// Create a client for the daemon at `base_url`
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(base_url.as_ref())?,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(ClientError::Url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)?).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json().await?)
    }

    /// Daemon liveness
    ///
    /// # Errors
    /// Returns an error if the daemon is unreachable or unhealthy.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health").await
    }

    /// Latest release known to the daemon
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn latest_release(&self) -> Result<LatestReleaseResponse> {
        self.get("/api/release").await
    }

    /// Ask the daemon to install the latest release
    ///
    /// Returns the daemon's plain-text confirmation.
    ///
    /// # Errors
    /// Returns `ClientError::Api` carrying the daemon's message when the
    /// update is rejected or fails.
    pub async fn trigger_update(&self) -> Result<String> {
        let response = self.client.post(self.url("/api/update")?).send().await?;
        let status = response.status();
        let message = response.text().await?;

        if status.is_success() {
            Ok(message)
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
