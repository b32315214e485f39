//! Review generator error types.

use thiserror::Error;

/// Errors that can occur while generating a review.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// TCP/HTTP connection to the generative endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The endpoint did not respond within the request timeout.
    #[error("review request timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response had no usable text (blocked prompt, empty candidates).
    #[error("no review text in response: {reason}")]
    EmptyResponse { reason: String },

    /// The response body could not be decoded.
    #[error("failed to decode review response: {reason}")]
    Decode { reason: String },
}
