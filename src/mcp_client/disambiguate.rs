//! Pick the authoritative response out of a noisy stdout capture.
//!
//! Tool servers may print diagnostic JSON before or after the real answer,
//! and broken ones print plain text. Lines are scanned from last to first:
//! an object carrying `tool_result` or `error` wins outright; otherwise the
//! last object in the text is kept as a fallback.

use serde_json::{Map, Value};

use super::errors::McpError;
use super::types::{truncate_chars, DETAIL_LIMIT};

/// Keys that mark a line as the server's answer.
const TAGGED_KEYS: [&str; 2] = ["tool_result", "error"];

/// Result of scanning stdout.
#[derive(Debug, Default)]
pub struct Selection {
    pub candidate: Option<Map<String, Value>>,
    /// First parse failure in scan order (i.e. nearest the end of output).
    pub first_parse_error: Option<String>,
}

/// Scan `stdout` backwards and select the response candidate.
pub fn select_response(stdout: &str) -> Selection {
    let mut selection = Selection::default();

    for line in stdout.lines().rev() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_object(line) {
            Ok(object) => {
                if is_tagged(&object) {
                    selection.candidate = Some(object);
                    break;
                }
                if selection.candidate.is_none() {
                    selection.candidate = Some(object);
                }
            }
            Err(e) => {
                if selection.first_parse_error.is_none() {
                    selection.first_parse_error = Some(e);
                }
            }
        }
    }

    selection
}

/// Select the response or fail with `NoParsableResponse`.
pub fn disambiguate(stdout: &str) -> Result<Map<String, Value>, McpError> {
    let selection = select_response(stdout);
    match selection.candidate {
        Some(object) => Ok(object),
        None => Err(McpError::NoParsableResponse {
            raw_stdout: truncate_chars(stdout.trim(), DETAIL_LIMIT),
            parse_error: selection.first_parse_error,
        }),
    }
}

fn is_tagged(object: &Map<String, Value>) -> bool {
    TAGGED_KEYS.iter().any(|key| object.contains_key(*key))
}

fn parse_object(line: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_type_name(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
