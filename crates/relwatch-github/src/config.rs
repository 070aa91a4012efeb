//! Registry connection settings

use serde::{Deserialize, Serialize};

/// Settings for the GitHub release registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repository: String,
    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Personal access token, raises the rate limit
    #[serde(default)]
    pub token: Option<String>,
    /// Per-request timeout for API calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl RegistryConfig {
    /// Config for a public repository on github.com
    pub fn new(owner: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            api_url: default_api_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Override the API base URL
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set an access token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
