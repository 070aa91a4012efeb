//! GitHub Releases client

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use url::Url;

use relwatch_core::{ArtifactFetcher, ArtifactRef, Release, ReleaseSource, SourceError};

use crate::config::RegistryConfig;
use crate::error::{GithubError, Result};
use crate::types::{GithubErrorBody, GithubRelease};

const API_MEDIA_TYPE: &str = "application/vnd.github+json";
const BINARY_MEDIA_TYPE: &str = "application/octet-stream";
const RELEASES_PER_PAGE: u32 = 30;

/// Release source backed by the GitHub REST API
#[derive(Debug, Clone)]
pub struct GithubReleaseSource {
    client: Client,
    base_url: String,
    owner: String,
    repository: String,
    token: Option<String>,
    timeout: Duration,
}

impl GithubReleaseSource {
    /// Create a new client from registry settings
    ///
    /// # Errors
    /// Returns an error if the API URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        // Validate early so later joins cannot fail on the base
        Url::parse(&config.api_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("relwatch/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repository: config.repository.clone(),
            token: config.token.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        })
    }

    /// Build a full URL for a path below the repository
    fn repo_url(&self, path: &str) -> Result<Url> {
        let url = format!(
            "{}/repos/{}/{}{}",
            self.base_url, self.owner, self.repository, path
        );
        Ok(Url::parse(&url)?)
    }

    /// URL of the release with `tag`, escaped as a single path segment
    fn tag_url(&self, tag: &str) -> Result<Url> {
        let mut url = self.repo_url("/releases/tags")?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(tag);
        Ok(url)
    }

    /// Start a GET request with auth and media type headers
    fn get(&self, url: Url, accept: &'static str) -> RequestBuilder {
        let request = self.client.get(url).header(ACCEPT, accept);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    /// Turn non-success responses into errors
    async fn check(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN
                && response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .is_some_and(|v| v == "0"));

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GithubErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        if status == StatusCode::NOT_FOUND {
            return Err(GithubError::NotFound(what.to_string()));
        }
        if rate_limited {
            return Err(GithubError::RateLimited {
                status: status.as_u16(),
                message,
            });
        }
        Err(GithubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        let response = self
            .get(url, API_MEDIA_TYPE)
            .timeout(self.timeout)
            .send()
            .await?;
        let response = Self::check(response, what).await?;
        Ok(response.json().await?)
    }

    /// List the most recent releases
    ///
    /// # Errors
    /// Returns an error if the request fails or GitHub returns an error.
    #[instrument(skip(self), fields(repo = %self.repository), level = "debug")]
    pub async fn releases(&self) -> Result<Vec<GithubRelease>> {
        let mut url = self.repo_url("/releases")?;
        url.query_pairs_mut()
            .append_pair("per_page", &RELEASES_PER_PAGE.to_string());

        let releases: Vec<GithubRelease> = self.get_json(url, "releases").await?;
        debug!(count = releases.len(), "fetched releases");
        Ok(releases)
    }

    /// Get a release by tag
    ///
    /// # Errors
    /// Returns `GithubError::NotFound` if no release has this tag.
    #[instrument(skip(self), level = "debug")]
    pub async fn release_by_tag(&self, tag: &str) -> Result<GithubRelease> {
        let url = self.tag_url(tag)?;
        self.get_json(url, &format!("release {tag}")).await
    }

    /// Stream an asset's content into `dest`, returning bytes written
    ///
    /// No overall timeout applies; rootfs images may take minutes.
    ///
    /// # Errors
    /// Returns an error if the request fails or the file cannot be written.
    #[instrument(skip(self), level = "debug")]
    pub async fn download_asset(&self, id: u64, dest: &Path) -> Result<u64> {
        let url = self.repo_url(&format!("/releases/assets/{id}"))?;
        let response = self.get(url, BINARY_MEDIA_TYPE).send().await?;
        let mut response = Self::check(response, &format!("asset {id}")).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(id, written, dest = %dest.display(), "asset downloaded");
        Ok(written)
    }
}

#[async_trait]
impl ReleaseSource for GithubReleaseSource {
    async fn list_releases(&self) -> std::result::Result<Vec<Release>, SourceError> {
        let releases = self.releases().await?;
        Ok(releases.into_iter().map(Release::from).collect())
    }

    async fn resolve_artifact(
        &self,
        tag: &str,
        name: &str,
    ) -> std::result::Result<ArtifactRef, SourceError> {
        let release: Release = self.release_by_tag(tag).await?.into();

        release
            .find_asset(name)
            .map(ArtifactRef::from)
            .ok_or_else(|| SourceError::ArtifactNotFound {
                tag: tag.to_string(),
                name: name.to_string(),
            })
    }

    fn source_type(&self) -> &'static str {
        "github"
    }
}

#[async_trait]
impl ArtifactFetcher for GithubReleaseSource {
    async fn fetch(
        &self,
        artifact: &ArtifactRef,
        dest: &Path,
    ) -> std::result::Result<u64, SourceError> {
        Ok(self.download_asset(artifact.id, dest).await?)
    }
}
