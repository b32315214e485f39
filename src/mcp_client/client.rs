//! Stdio tool client: high-level interface for a single tool invocation.
//!
//! Drives one session end to end: encode → launch/communicate → classify
//! exit → disambiguate stdout → extract. Every stage either hands off to the
//! next or terminates with a classified outcome; nothing is retried.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::Instrument;

use super::disambiguate::disambiguate;
use super::errors::McpError;
use super::extract::extract_outcome;
use super::session::ProcessSession;
use super::transport::encode_invocation;
use super::types::{CapturedOutput, LaunchSpec, Secret, ToolInvocationOutcome};

/// Tool that returns the authenticated user's account.
pub const GET_ME_TOOL: &str = "get_me";

// ─── Settings ────────────────────────────────────────────────────────────────

/// How to launch the tool server.
#[derive(Debug, Clone)]
pub struct McpServerSettings {
    /// Container runtime binary (e.g., "docker", "podman").
    pub runtime: String,
    /// Image reference of the tool server.
    pub image: String,
    pub timeout: Duration,
}

// ─── StdioToolClient ─────────────────────────────────────────────────────────

/// Client that runs each invocation in a fresh child process.
///
/// Holds no mutable state; clones can run invocations concurrently, each with
/// its own session.
#[derive(Debug, Clone)]
pub struct StdioToolClient {
    session: ProcessSession,
}

impl StdioToolClient {
    /// Client for the containerized tool server, with `token` injected into
    /// the child's environment.
    pub fn new(settings: &McpServerSettings, token: Secret) -> Self {
        let launch = LaunchSpec::container(&settings.runtime, &settings.image, token);
        Self::from_launch(launch, settings.timeout)
    }

    /// Client for an arbitrary launch command.
    pub fn from_launch(launch: LaunchSpec, timeout: Duration) -> Self {
        Self {
            session: ProcessSession::new(launch).with_timeout(timeout),
        }
    }

    /// Invoke `get_me` with no arguments.
    pub async fn get_me(&self) -> ToolInvocationOutcome {
        self.invoke(GET_ME_TOOL, &serde_json::json!({})).await
    }

    /// Invoke `tool_name` once and classify whatever comes back.
    pub async fn invoke<A: Serialize>(
        &self,
        tool_name: &str,
        arguments: &A,
    ) -> ToolInvocationOutcome {
        let span = tracing::info_span!(
            "tool_invocation",
            session_id = %uuid::Uuid::new_v4(),
            tool = tool_name,
        );

        async {
            let start = Instant::now();
            let outcome = match self.run(tool_name, arguments).await {
                Ok(outcome) => outcome,
                Err(e) => e.into(),
            };
            log_outcome(&outcome, start.elapsed());
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run<A: Serialize>(
        &self,
        tool_name: &str,
        arguments: &A,
    ) -> Result<ToolInvocationOutcome, McpError> {
        let request_line = encode_invocation(tool_name, arguments)?;
        let captured = self.session.run(&request_line).await?;
        classify_capture(&captured, self.session.timeout())
    }
}

/// Classify a finished capture: exit status first, then stdout content.
pub fn classify_capture(
    captured: &CapturedOutput,
    timeout: Duration,
) -> Result<ToolInvocationOutcome, McpError> {
    if captured.timed_out {
        return Err(McpError::TimedOut {
            timeout_secs: timeout.as_secs(),
            stderr: captured.stderr.clone(),
        });
    }

    if captured.exit_code != Some(0) {
        return Err(McpError::process_exit(
            captured.exit_code,
            &captured.stdout,
            &captured.stderr,
        ));
    }

    if captured.stdout.trim().is_empty() {
        return Err(McpError::EmptyResponse {
            stderr: captured.stderr.clone(),
        });
    }

    let response = disambiguate(&captured.stdout)?;
    Ok(extract_outcome(&response))
}

fn log_outcome(outcome: &ToolInvocationOutcome, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        ToolInvocationOutcome::Success(account) => {
            tracing::info!(login = %account.login, elapsed_ms, "tool invocation succeeded")
        }
        ToolInvocationOutcome::ToolError { message, .. } => {
            tracing::warn!(error = %message, elapsed_ms, "tool server returned an error")
        }
        ToolInvocationOutcome::TransportError(e) => {
            tracing::warn!(kind = ?e.kind(), error = %e, elapsed_ms, "tool invocation failed")
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
