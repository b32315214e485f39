//! Review generator: asks a generative-language endpoint to review a pull
//! request.

pub mod client;
pub mod errors;
pub mod prompt;

pub use client::{ReviewClient, SKIP_REVIEW_MESSAGE};
pub use errors::ReviewError;
