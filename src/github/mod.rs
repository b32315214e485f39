//! GitHub REST collaborator: pull-request metadata, diffs, and comments.

pub mod client;
pub mod errors;
pub mod pr_url;

pub use client::{GitHubClient, PullRequestDetails};
pub use errors::GitHubError;
pub use pr_url::PullRequestRef;
