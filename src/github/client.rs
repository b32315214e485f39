//! GitHub REST client.
//!
//! Fetches pull-request metadata and diff, and posts review comments. Each
//! call is a single HTTP request with no retry.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use super::errors::GitHubError;
use super::pr_url::PullRequestRef;
use crate::mcp_client::Secret;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout. Diffs of large pull requests can be slow to render.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_DIFF: &str = "application/vnd.github.v3.diff";
const API_VERSION: &str = "2022-11-28";

// ─── Types ───────────────────────────────────────────────────────────────────

/// What the review generator needs to know about a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDetails {
    pub title: String,
    pub body: String,
    pub diff: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    title: String,
    body: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

// ─── GitHubClient ────────────────────────────────────────────────────────────

pub struct GitHubClient {
    http: HttpClient,
    api_base: String,
    token: Secret,
}

impl GitHubClient {
    pub fn new(api_base: &str, token: Secret) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("mcp-review-agent/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| GitHubError::Request {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Fetch title, body and unified diff of a pull request.
    pub async fn fetch_pull_request(
        &self,
        pr: &PullRequestRef,
    ) -> Result<PullRequestDetails, GitHubError> {
        let url = self.pull_url(pr);
        tracing::info!(pull_request = %pr, "fetching pull request");

        let meta_response = self.get(&url, ACCEPT_JSON).await?;
        let meta = check_status(meta_response, &pr.to_string())
            .await?
            .json::<PullRequestResponse>()
            .await
            .map_err(|e| GitHubError::Decode {
                reason: e.to_string(),
            })?;

        let diff_response = self.get(&url, ACCEPT_DIFF).await?;
        let diff = check_status(diff_response, &pr.to_string())
            .await?
            .text()
            .await
            .map_err(|e| GitHubError::Decode {
                reason: e.to_string(),
            })?;

        tracing::debug!(
            pull_request = %pr,
            diff_bytes = diff.len(),
            "pull request fetched"
        );

        Ok(PullRequestDetails {
            title: meta.title,
            body: meta.body.unwrap_or_default(),
            diff,
        })
    }

    /// Post `text` as an issue comment on the pull request.
    pub async fn post_comment(&self, pr: &PullRequestRef, text: &str) -> Result<(), GitHubError> {
        let url = self.comments_url(pr);
        tracing::info!(pull_request = %pr, chars = text.chars().count(), "posting comment");

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.bearer())
            .header(ACCEPT, ACCEPT_JSON)
            .json(&CommentRequest { body: text })
            .send()
            .await?;

        check_status(response, &pr.to_string()).await?;
        Ok(())
    }

    fn pull_url(&self, pr: &PullRequestRef) -> String {
        format!("{}/repos/{}/{}/pulls/{}", self.api_base, pr.owner, pr.repo, pr.number)
    }

    fn comments_url(&self, pr: &PullRequestRef) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_base, pr.owner, pr.repo, pr.number
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose())
    }

    async fn get(&self, url: &str, accept: &'static str) -> Result<reqwest::Response, GitHubError> {
        Ok(self
            .http
            .get(url)
            .header(AUTHORIZATION, self.bearer())
            .header(ACCEPT, accept)
            .send()
            .await?)
    }
}

/// Pass 2xx responses through; classify everything else.
async fn check_status(
    response: reqwest::Response,
    resource: &str,
) -> Result<reqwest::Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), resource, "GitHub request failed");
    Err(GitHubError::from_status(status.as_u16(), resource, body))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
