//! Convert the selected response record into a typed outcome.

use serde_json::{Map, Value};

use super::errors::McpError;
use super::types::{truncate_chars, AccountSummary, ToolInvocationOutcome, DETAIL_LIMIT};

/// Placeholder for account fields the server did not send.
const MISSING_FIELD: &str = "N/A";

const UNKNOWN_ERROR: &str = "Unknown error";

/// Turn the winning response object into a `ToolInvocationOutcome`.
///
/// Never fails outright: shape problems come back as `TransportError`.
pub fn extract_outcome(response: &Map<String, Value>) -> ToolInvocationOutcome {
    if let Some(error) = response.get("error") {
        return ToolInvocationOutcome::ToolError {
            message: error_message(error),
            details: error.clone(),
        };
    }

    match extract_payload(response) {
        Ok(payload) => ToolInvocationOutcome::Success(AccountSummary {
            login: string_field(payload, "login"),
            name: string_field(payload, "name"),
        }),
        Err(e) => ToolInvocationOutcome::TransportError(e),
    }
}

/// Locate the result payload object.
fn extract_payload(response: &Map<String, Value>) -> Result<&Map<String, Value>, McpError> {
    let payload = match response.get("tool_result").filter(|v| !is_empty_value(v)) {
        None => {
            // Some servers reply with the user object itself.
            if response.contains_key("login") && response.contains_key("id") {
                return Ok(response);
            }
            return Err(McpError::UnexpectedShape {
                response: truncated_json(&Value::Object(response.clone())),
            });
        }
        Some(tool_result) => match tool_result.get("result") {
            None | Some(Value::Null) => {
                return Err(McpError::MissingResult {
                    tool_result: truncated_json(tool_result),
                })
            }
            Some(result) => result,
        },
    };

    payload.as_object().ok_or_else(|| McpError::UnexpectedShape {
        response: truncated_json(payload),
    })
}

/// `null`, `false`, zero, and empty strings/arrays/objects carry no result.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => UNKNOWN_ERROR.to_string(),
        },
        Value::String(message) => message.clone(),
        _ => UNKNOWN_ERROR.to_string(),
    }
}

fn string_field(payload: &Map<String, Value>, key: &str) -> String {
    match payload.get(key) {
        None | Some(Value::Null) => MISSING_FIELD.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truncated_json(value: &Value) -> String {
    truncate_chars(&value.to_string(), DETAIL_LIMIT)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
