//! Shared types for the MCP stdio client.
//!
//! Wire request shape, captured process output, launch description, and the
//! outcome handed back to callers.

use std::fmt;

use serde::Serialize;

use super::errors::McpError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Protocol version stamped on every request.
pub const MCP_VERSION: &str = "0.1.0";

/// Environment variable that carries the repository credential into the child.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";

/// Character limit for JSON payloads echoed in diagnostics.
pub const DETAIL_LIMIT: usize = 500;

/// Character limit for process exit / stderr messages.
pub const EXIT_MESSAGE_LIMIT: usize = 1000;

// ─── Wire Request ────────────────────────────────────────────────────────────

/// The single outbound tool-invocation record.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocationRequest {
    pub mcp_version: &'static str,
    pub tool_invocation: ToolInvocation,
}

/// The `tool_invocation` body of a request.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolInvocationRequest {
    pub fn new(tool_name: &str, arguments: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            mcp_version: MCP_VERSION,
            tool_invocation: ToolInvocation {
                tool_name: tool_name.to_string(),
                arguments,
            },
        }
    }
}

// ─── Credentials ─────────────────────────────────────────────────────────────

/// A credential value that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value. Only call this where the secret leaves the process
    /// (child env, HTTP header).
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

// ─── Launch Description ──────────────────────────────────────────────────────

/// Everything needed to start the tool server child process.
#[derive(Clone)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment for the child. Values are never logged.
    pub env: Vec<(String, Secret)>,
}

impl LaunchSpec {
    /// `<runtime> run -i --rm -e GITHUB_PERSONAL_ACCESS_TOKEN <image>`.
    ///
    /// `-e NAME` without a value makes the runtime forward the variable from
    /// its own environment, so the token stays out of argv.
    pub fn container(runtime: &str, image: &str, token: Secret) -> Self {
        Self {
            program: runtime.to_string(),
            args: vec![
                "run".into(),
                "-i".into(),
                "--rm".into(),
                "-e".into(),
                GITHUB_TOKEN_ENV.into(),
                image.to_string(),
            ],
            env: vec![(GITHUB_TOKEN_ENV.to_string(), token)],
        }
    }
}

impl fmt::Debug for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("LaunchSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &env_keys)
            .finish()
    }
}

// ─── Captured Output ─────────────────────────────────────────────────────────

/// Everything a session observed from the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was killed (timeout or signal).
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl CapturedOutput {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Account fields pulled from a successful `get_me`-style result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub login: String,
    pub name: String,
}

/// The one terminal result of a tool invocation session.
#[derive(Debug)]
pub enum ToolInvocationOutcome {
    Success(AccountSummary),
    /// The server answered with a protocol-level `error` object.
    ToolError {
        message: String,
        details: serde_json::Value,
    },
    TransportError(McpError),
}

impl ToolInvocationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolInvocationOutcome::Success(_))
    }
}

impl From<McpError> for ToolInvocationOutcome {
    fn from(e: McpError) -> Self {
        ToolInvocationOutcome::TransportError(e)
    }
}

impl fmt::Display for ToolInvocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolInvocationOutcome::Success(account) => write!(
                f,
                "Hello, {}! Your name is {} (via MCP).",
                account.login, account.name
            ),
            ToolInvocationOutcome::ToolError { message, details } => write!(
                f,
                "Error from MCP server: {message}. Details: {}",
                truncate_chars(&details.to_string(), DETAIL_LIMIT)
            ),
            ToolInvocationOutcome::TransportError(e) => write!(f, "{e}"),
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Keep at most `limit` characters (not bytes) of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_launch_spec_keeps_token_out_of_argv() {
        let spec = LaunchSpec::container(
            "docker",
            "ghcr.io/github/github-mcp-server",
            Secret::new("ghp_supersecret"),
        );
        assert_eq!(
            spec.args,
            vec!["run", "-i", "--rm", "-e", GITHUB_TOKEN_ENV, "ghcr.io/github/github-mcp-server"]
        );
        assert!(spec.args.iter().all(|a| !a.contains("ghp_supersecret")));
        assert_eq!(spec.env[0].1.expose(), "ghp_supersecret");

        let debug = format!("{spec:?}");
        assert!(!debug.contains("ghp_supersecret"));
        assert!(debug.contains(GITHUB_TOKEN_ENV));
    }

    #[test]
    fn test_secret_redacted() {
        let s = Secret::new("hunter2");
        assert_eq!(format!("{s:?}"), "Secret(***)");
        assert_eq!(format!("{s}"), "***");
    }

    #[test]
    fn test_success_display() {
        let outcome = ToolInvocationOutcome::Success(AccountSummary {
            login: "testuser".into(),
            name: "Test User".into(),
        });
        assert_eq!(
            outcome.to_string(),
            "Hello, testuser! Your name is Test User (via MCP)."
        );
        assert!(outcome.is_success());
    }

    #[test]
    fn test_tool_error_display_truncates_details() {
        let details = serde_json::json!({
            "message": "Invalid token or insufficient permissions",
            "code": 401
        });
        let expected = format!(
            "Error from MCP server: Invalid token or insufficient permissions. Details: {}",
            details
        );
        let outcome = ToolInvocationOutcome::ToolError {
            message: "Invalid token or insufficient permissions".into(),
            details,
        };
        assert_eq!(outcome.to_string(), expected);

        let huge = ToolInvocationOutcome::ToolError {
            message: "x".into(),
            details: serde_json::json!({ "blob": "y".repeat(2000) }),
        };
        let text = huge.to_string();
        let detail_part = text.split("Details: ").nth(1).unwrap();
        assert_eq!(detail_part.chars().count(), DETAIL_LIMIT);
    }

    #[test]
    fn test_captured_output_succeeded() {
        let mut out = CapturedOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            timed_out: false,
        };
        assert!(out.succeeded());
        out.exit_code = Some(1);
        assert!(!out.succeeded());
        out.exit_code = None;
        out.timed_out = true;
        assert!(!out.succeeded());
    }
}
