//! MCP Client: one-shot tool invocation over a child process's stdio.
//!
//! This module handles:
//! - Encoding a single line-delimited JSON tool invocation
//! - Spawning the tool server, writing the request, capturing stdout/stderr
//! - Enforcing the session time budget and reaping the child on every path
//! - Picking the authoritative response out of noisy output
//! - Turning that response into a typed outcome
//!
//! A session never reuses its child: one request, one response, exit.

pub mod client;
pub mod disambiguate;
pub mod errors;
pub mod extract;
pub mod session;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{McpServerSettings, StdioToolClient, GET_ME_TOOL};
pub use errors::{McpError, TransportErrorKind};
pub use session::ProcessSession;
pub use types::{AccountSummary, CapturedOutput, LaunchSpec, Secret, ToolInvocationOutcome};
