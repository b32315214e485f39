//! Pull-request URL parsing.
//!
//! Accepts `scheme://host/owner/repo/pull/number` with an optional trailing
//! slash. The host is not checked, so GitHub Enterprise URLs parse too.

use std::fmt;

use reqwest::Url;

use super::errors::GitHubError;

/// Coordinates of one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    pub fn parse(url: &str) -> Result<Self, GitHubError> {
        let invalid = |reason: &str| GitHubError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url.trim()).map_err(|e| invalid(&e.to_string()))?;
        if parsed.host_str().is_none() {
            return Err(invalid("missing host"));
        }

        let mut segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();
        if segments.last() == Some(&"") {
            segments.pop();
        }

        match segments.as_slice() {
            [owner, repo, "pull", number] if !owner.is_empty() && !repo.is_empty() => {
                let number = number
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| invalid("pull request number must be a positive integer"))?;
                Ok(Self {
                    owner: (*owner).to_string(),
                    repo: (*repo).to_string(),
                    number,
                })
            }
            _ => Err(invalid("expected a path of the form /owner/repo/pull/number")),
        }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}
