//! Review prompt construction.

use crate::github::PullRequestDetails;
use crate::mcp_client::types::truncate_chars;

/// Diffs longer than this (in characters) are cut before prompting.
pub const MAX_DIFF_CHARS: usize = 60_000;

const INSTRUCTIONS: &str = "You are an experienced software engineer reviewing a pull request. \
Point out bugs, risky changes, missing tests, and unclear code. Be concise and specific, \
reference file names from the diff, and finish with an overall recommendation.";

/// Build the single prompt sent to the generative endpoint.
pub fn build_review_prompt(details: &PullRequestDetails) -> String {
    let diff = truncate_chars(&details.diff, MAX_DIFF_CHARS);
    let truncated_note = if diff.len() < details.diff.len() {
        "\n\n(The diff was truncated.)"
    } else {
        ""
    };
    let body = if details.body.trim().is_empty() {
        "(no description)"
    } else {
        details.body.trim()
    };

    format!(
        "{INSTRUCTIONS}\n\nTitle: {title}\n\nDescription:\n{body}\n\nDiff:\n```diff\n{diff}\n```{truncated_note}",
        title = details.title.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(body: &str, diff: &str) -> PullRequestDetails {
        PullRequestDetails {
            title: "Add retry to uploader".into(),
            body: body.into(),
            diff: diff.into(),
        }
    }

    #[test]
    fn test_prompt_contains_title_body_and_diff() {
        let prompt = build_review_prompt(&details("Retries 3 times.", "+retry(3)"));
        assert!(prompt.contains("Title: Add retry to uploader"));
        assert!(prompt.contains("Retries 3 times."));
        assert!(prompt.contains("```diff\n+retry(3)\n```"));
        assert!(!prompt.contains("truncated"));
    }

    #[test]
    fn test_empty_body_placeholder() {
        let prompt = build_review_prompt(&details("  ", "+x"));
        assert!(prompt.contains("(no description)"));
    }

    #[test]
    fn test_long_diff_truncated() {
        let diff = "+".repeat(MAX_DIFF_CHARS + 10);
        let prompt = build_review_prompt(&details("b", &diff));
        assert!(prompt.contains("(The diff was truncated.)"));
        assert!(!prompt.contains(&diff));
    }
}
