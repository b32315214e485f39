//! Generative-language review client.
//!
//! Sends one `generateContent` request per pull request and returns the
//! model's text. Blank diffs short-circuit without any HTTP call.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use super::errors::ReviewError;
use super::prompt::build_review_prompt;
use crate::github::PullRequestDetails;
use crate::mcp_client::Secret;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout. Long diffs take a while to review.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Returned instead of a review when the pull request has no changes.
pub const SKIP_REVIEW_MESSAGE: &str =
    "No changes detected in the pull request diff; skipping review.";

// ─── Wire Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

// ─── ReviewClient ────────────────────────────────────────────────────────────

pub struct ReviewClient {
    http: HttpClient,
    api_base: String,
    model: String,
    api_key: Secret,
}

impl ReviewClient {
    pub fn new(api_base: &str, model: &str, api_key: Secret) -> Result<Self, ReviewError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReviewError::ConnectionFailed {
                endpoint: api_base.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// The model that reviews are requested from.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for a review of `details`.
    pub async fn generate_review(
        &self,
        details: &PullRequestDetails,
    ) -> Result<String, ReviewError> {
        if details.diff.trim().is_empty() {
            tracing::info!("empty diff; skipping review request");
            return Ok(SKIP_REVIEW_MESSAGE.to_string());
        }

        let url = self.endpoint();
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_review_prompt(details)),
                }],
            }],
        };

        tracing::info!(model = %self.model, diff_bytes = details.diff.len(), "requesting review");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReviewError::Timeout {
                        duration_secs: REQUEST_TIMEOUT.as_secs(),
                    }
                } else {
                    ReviewError::ConnectionFailed {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ReviewError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response.text().await.map_err(|e| ReviewError::Decode {
            reason: format!("failed to read response body: {e}"),
        })?;

        parse_review_response(&body_text)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }
}

/// Pull the first candidate's text out of a `generateContent` response.
fn parse_review_response(body: &str) -> Result<String, ReviewError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ReviewError::Decode {
            reason: e.to_string(),
        })?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = match parsed.prompt_feedback {
            Some(feedback) => format!("no candidates (prompt feedback: {feedback})"),
            None => "no candidates".to_string(),
        };
        return Err(ReviewError::EmptyResponse { reason });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ReviewError::EmptyResponse {
            reason: format!(
                "candidate had no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    Ok(text.trim().to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
