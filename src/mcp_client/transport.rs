//! Line-delimited JSON framing for the stdio protocol.
//!
//! One request goes out as exactly one line of JSON followed by `\n`.

use serde::Serialize;

use super::errors::McpError;
use super::types::ToolInvocationRequest;

/// Encode a tool invocation as a newline-terminated JSON line.
pub fn encode_request(request: &ToolInvocationRequest) -> Result<String, McpError> {
    let mut json = serde_json::to_string(request).map_err(|e| McpError::EncodingFailure {
        reason: format!("failed to serialize request: {e}"),
    })?;
    json.push('\n');
    Ok(json)
}

/// Build and encode a request from any serializable argument value.
///
/// The arguments must serialize to a JSON object.
pub fn encode_invocation<A: Serialize>(
    tool_name: &str,
    arguments: &A,
) -> Result<String, McpError> {
    let value = serde_json::to_value(arguments).map_err(|e| McpError::EncodingFailure {
        reason: format!("arguments for '{tool_name}' are not serializable: {e}"),
    })?;

    let arguments = match value {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            return Err(McpError::EncodingFailure {
                reason: format!("arguments for '{tool_name}' must be a JSON object, got {other}"),
            })
        }
    };

    encode_request(&ToolInvocationRequest::new(tool_name, arguments))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
