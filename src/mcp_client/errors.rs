//! MCP stdio client error types.
//!
//! Every variant is a classified transport failure. None of them are fatal:
//! the client folds them into a [`ToolInvocationOutcome`] and the caller
//! renders them through `Display`.
//!
//! [`ToolInvocationOutcome`]: super::types::ToolInvocationOutcome

use thiserror::Error;

use super::types::{truncate_chars, DETAIL_LIMIT, EXIT_MESSAGE_LIMIT};

/// Classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    LaunchFailure,
    ProcessExit,
    TimedOut,
    EmptyResponse,
    NoParsableResponse,
    UnexpectedShape,
    MissingResult,
    EncodingFailure,
}

/// Errors that can occur during a single stdio tool invocation.
#[derive(Debug, Error)]
pub enum McpError {
    /// The child process could not be started or fed its request.
    #[error("Failed to run/communicate with MCP server process: {reason}")]
    LaunchFailure { reason: String },

    /// The child exited unsuccessfully. `code` is `None` when it was killed
    /// by a signal.
    #[error(
        "MCP server process error (return code {}): {message}",
        code.map_or_else(|| "signal".to_string(), |c| c.to_string())
    )]
    ProcessExit { code: Option<i32>, message: String },

    /// The child did not exit within the session budget.
    #[error(
        "MCP server process timed out after {timeout_secs}s. The image may still be \
         downloading or the server is slow to start. Stderr: {}",
        stderr_or_na(stderr)
    )]
    TimedOut { timeout_secs: u64, stderr: String },

    /// The child exited cleanly but wrote nothing on stdout.
    #[error(
        "No response from MCP server on stdout. Stderr: {}",
        stderr_or_placeholder(stderr)
    )]
    EmptyResponse { stderr: String },

    /// No stdout line parsed as a JSON object.
    #[error("{}", no_parsable_message(raw_stdout, parse_error.as_deref()))]
    NoParsableResponse {
        raw_stdout: String,
        parse_error: Option<String>,
    },

    /// The selected record has neither `tool_result` nor a bare user payload.
    #[error(
        "Unexpected MCP response format. Missing 'tool_result' and response doesn't \
         look like user data. Response: {}",
        truncate_chars(response, DETAIL_LIMIT)
    )]
    UnexpectedShape { response: String },

    /// `tool_result` was present but carried no `result`.
    #[error(
        "MCP tool result is missing or null within 'tool_result'. Full 'tool_result' \
         content: {}",
        truncate_chars(tool_result, DETAIL_LIMIT)
    )]
    MissingResult { tool_result: String },

    /// The request could not be encoded.
    #[error("failed to encode MCP request: {reason}")]
    EncodingFailure { reason: String },
}

impl McpError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            McpError::LaunchFailure { .. } => TransportErrorKind::LaunchFailure,
            McpError::ProcessExit { .. } => TransportErrorKind::ProcessExit,
            McpError::TimedOut { .. } => TransportErrorKind::TimedOut,
            McpError::EmptyResponse { .. } => TransportErrorKind::EmptyResponse,
            McpError::NoParsableResponse { .. } => TransportErrorKind::NoParsableResponse,
            McpError::UnexpectedShape { .. } => TransportErrorKind::UnexpectedShape,
            McpError::MissingResult { .. } => TransportErrorKind::MissingResult,
            McpError::EncodingFailure { .. } => TransportErrorKind::EncodingFailure,
        }
    }

    /// Build a `ProcessExit` error, preferring stderr over stdout.
    pub fn process_exit(code: Option<i32>, stdout: &str, stderr: &str) -> Self {
        let stderr = stderr.trim();
        let stdout = stdout.trim();
        let message = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            "Unknown error from MCP server process."
        };
        McpError::ProcessExit {
            code,
            message: truncate_chars(message, EXIT_MESSAGE_LIMIT),
        }
    }
}

fn stderr_or_na(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        "N/A".to_string()
    } else {
        truncate_chars(trimmed, DETAIL_LIMIT)
    }
}

fn stderr_or_placeholder(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        "No error message on stderr.".to_string()
    } else {
        truncate_chars(trimmed, EXIT_MESSAGE_LIMIT)
    }
}

fn no_parsable_message(raw_stdout: &str, parse_error: Option<&str>) -> String {
    match parse_error {
        Some(e) => format!(
            "Failed to find or parse a JSON response from MCP server. Last decode error: {e}. \
             Raw stdout: {raw_stdout}"
        ),
        None => format!("No valid JSON response found in MCP server stdout. Raw stdout: {raw_stdout}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exit_prefers_stderr() {
        let err = McpError::process_exit(Some(1), "oops", "boom\n");
        match &err {
            McpError::ProcessExit { code, message } => {
                assert_eq!(*code, Some(1));
                assert_eq!(message, "boom");
            }
            other => panic!("expected ProcessExit, got {other:?}"),
        }
        assert_eq!(err.to_string(), "MCP server process error (return code 1): boom");
    }

    #[test]
    fn test_process_exit_falls_back_to_stdout() {
        let err = McpError::process_exit(Some(1), "oops", "   ");
        assert!(matches!(err, McpError::ProcessExit { ref message, .. } if message == "oops"));
    }

    #[test]
    fn test_process_exit_truncates_to_limit() {
        let long = "x".repeat(5000);
        let err = McpError::process_exit(Some(2), "", &long);
        match err {
            McpError::ProcessExit { message, .. } => {
                assert_eq!(message.chars().count(), EXIT_MESSAGE_LIMIT)
            }
            _ => panic!("expected ProcessExit"),
        }
    }

    #[test]
    fn test_process_exit_signal_display() {
        let err = McpError::process_exit(None, "", "");
        assert_eq!(
            err.to_string(),
            "MCP server process error (return code signal): Unknown error from MCP server process."
        );
    }

    #[test]
    fn test_timeout_without_stderr_says_na() {
        let err = McpError::TimedOut {
            timeout_secs: 60,
            stderr: String::new(),
        };
        let text = err.to_string();
        assert!(text.contains("timed out after 60s"));
        assert!(text.ends_with("Stderr: N/A"));
        assert_eq!(err.kind(), TransportErrorKind::TimedOut);
    }

    #[test]
    fn test_empty_response_placeholder() {
        let err = McpError::EmptyResponse {
            stderr: String::new(),
        };
        assert!(err.to_string().contains("No error message on stderr."));
    }

    #[test]
    fn test_no_parsable_variants() {
        let with_error = McpError::NoParsableResponse {
            raw_stdout: "garbage".into(),
            parse_error: Some("expected value at line 1 column 1".into()),
        };
        let text = with_error.to_string();
        assert!(text.contains("Failed to find or parse a JSON response from MCP server."));
        assert!(text.contains("Raw stdout: garbage"));

        let without = McpError::NoParsableResponse {
            raw_stdout: "".into(),
            parse_error: None,
        };
        assert!(without.to_string().starts_with("No valid JSON response found"));
    }
}
