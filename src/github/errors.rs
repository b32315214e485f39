//! GitHub REST error types.

use thiserror::Error;

/// Errors from the GitHub REST collaborator.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The pull-request URL does not have the expected shape.
    #[error("invalid pull request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP 401.
    #[error(
        "GitHub rejected the token (401 Unauthorized). Check that \
         GITHUB_PERSONAL_ACCESS_TOKEN is valid and not expired."
    )]
    Unauthorized,

    /// HTTP 403.
    #[error(
        "GitHub denied access (403 Forbidden). The token may lack the 'repo' scope \
         or pull-request write permission, or a rate limit was hit."
    )]
    Forbidden,

    /// HTTP 404.
    #[error(
        "GitHub could not find {resource} (404 Not Found). Check the URL, and that \
         the token can see private repositories."
    )]
    NotFound { resource: String },

    /// Any other non-2xx status.
    #[error("GitHub API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS, or timeout failure.
    #[error("request to GitHub failed: {reason}")]
    Request { reason: String },

    /// A 2xx response whose body could not be decoded.
    #[error("failed to decode GitHub response: {reason}")]
    Decode { reason: String },
}

impl GitHubError {
    /// Map a non-success status to the matching variant.
    pub fn from_status(status: u16, resource: &str, body: String) -> Self {
        match status {
            401 => GitHubError::Unauthorized,
            403 => GitHubError::Forbidden,
            404 => GitHubError::NotFound {
                resource: resource.to_string(),
            },
            _ => GitHubError::Http { status, body },
        }
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(e: reqwest::Error) -> Self {
        GitHubError::Request {
            reason: e.to_string(),
        }
    }
}
