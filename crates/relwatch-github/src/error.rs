//! Error types for the GitHub client

use relwatch_core::SourceError;
use thiserror::Error;

/// Errors that can occur when talking to GitHub
#[derive(Error, Debug)]
pub enum GithubError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exhausted
    #[error("rate limited ({status}): {message}")]
    RateLimited {
        /// HTTP status code
        status: u16,
        /// Error message from GitHub
        message: String,
    },

    /// API returned an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from GitHub
        message: String,
    },

    /// Writing a download failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, GithubError>;

impl From<GithubError> for SourceError {
    fn from(err: GithubError) -> Self {
        let message = err.to_string();
        match err {
            GithubError::NotFound(what) => SourceError::ReleaseNotFound(what),
            GithubError::RateLimited { .. } => SourceError::RateLimited(message),
            GithubError::Api { status, .. } if status >= 500 => SourceError::Unavailable(message),
            GithubError::Http(e) if e.is_connect() || e.is_timeout() => {
                SourceError::Unavailable(message)
            }
            GithubError::Io(_) => SourceError::Download(message),
            _ => SourceError::InvalidResponse(message),
        }
    }
}
