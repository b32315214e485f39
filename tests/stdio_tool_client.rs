//! End-to-end sessions against shell stand-ins for the tool server.

#![cfg(unix)]

use std::time::{Duration, Instant};

use mcp_review_agent::mcp_client::{
    LaunchSpec, Secret, StdioToolClient, ToolInvocationOutcome, TransportErrorKind,
};

const TIMEOUT: Duration = Duration::from_secs(10);

fn server(script: &str) -> StdioToolClient {
    server_with_timeout(script, TIMEOUT)
}

fn server_with_timeout(script: &str, timeout: Duration) -> StdioToolClient {
    StdioToolClient::from_launch(
        LaunchSpec {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            env: vec![("GITHUB_PERSONAL_ACCESS_TOKEN".into(), Secret::new("test_token"))],
        },
        timeout,
    )
}

fn transport_kind(outcome: &ToolInvocationOutcome) -> Option<TransportErrorKind> {
    match outcome {
        ToolInvocationOutcome::TransportError(e) => Some(e.kind()),
        _ => None,
    }
}

#[tokio::test]
async fn get_me_success() {
    let client = server(
        r#"read -r line; echo '{"tool_result":{"tool_name":"get_me","result":{"login":"alice","name":"Alice A","id":1}}}'"#,
    );
    match client.get_me().await {
        ToolInvocationOutcome::Success(account) => {
            assert_eq!(account.login, "alice");
            assert_eq!(account.name, "Alice A");
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

#[tokio::test]
async fn request_line_reaches_server_stdin() {
    // The stand-in only answers when it sees the exact wire request.
    let client = server(
        r#"read -r line
expected='{"mcp_version":"0.1.0","tool_invocation":{"tool_name":"get_me","arguments":{}}}'
if [ "$line" = "$expected" ]; then
  echo '{"tool_result":{"result":{"login":"wire","name":"Exact","id":2}}}'
else
  echo "unexpected request: $line" >&2
  exit 9
fi"#,
    );
    let outcome = client.get_me().await;
    assert_eq!(
        outcome.to_string(),
        "Hello, wire! Your name is Exact (via MCP)."
    );
}

#[tokio::test]
async fn credential_is_in_child_environment() {
    let client = server(
        r#"read -r line; printf '{"tool_result":{"result":{"login":"%s","id":1}}}\n' "$GITHUB_PERSONAL_ACCESS_TOKEN""#,
    );
    match client.get_me().await {
        ToolInvocationOutcome::Success(account) => {
            assert_eq!(account.login, "test_token");
            assert_eq!(account.name, "N/A");
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

#[tokio::test]
async fn trailing_error_wins_over_earlier_json() {
    let client = server(
        r#"read -r line
echo '{"log":"booting"}'
echo 'plain diagnostic text'
echo '{"error":{"message":"bad creds","code":401}}'"#,
    );
    match client.get_me().await {
        ToolInvocationOutcome::ToolError { message, details } => {
            assert_eq!(message, "bad creds");
            assert_eq!(details["code"], 401);
        }
        other => panic!("expected ToolError, got {other:?}"),
    }
}

#[tokio::test]
async fn tagged_line_beats_later_untagged_line() {
    let client = server(
        r#"read -r line
echo '{"tool_result":{"result":{"login":"tagged","name":"T","id":3}}}'
echo '{"status":"bye"}'"#,
    );
    match client.get_me().await {
        ToolInvocationOutcome::Success(account) => assert_eq!(account.login, "tagged"),
        other => panic!("expected Success, got {other:?}"),
    }
}

#[tokio::test]
async fn whitespace_stdout_is_empty_response() {
    let client = server(r#"read -r line; printf '  \n\n'; echo 'server said nothing' >&2"#);
    let outcome = client.get_me().await;
    assert_eq!(transport_kind(&outcome), Some(TransportErrorKind::EmptyResponse));
    assert!(outcome.to_string().contains("server said nothing"));
}

#[tokio::test]
async fn non_json_stdout_is_no_parsable_response() {
    let client = server(r#"read -r line; echo 'This is not valid JSON output'"#);
    let outcome = client.get_me().await;
    assert_eq!(
        transport_kind(&outcome),
        Some(TransportErrorKind::NoParsableResponse)
    );
    let text = outcome.to_string();
    assert!(text.contains("Failed to find or parse a JSON response from MCP server."));
    assert!(text.contains("Raw stdout: This is not valid JSON output"));
}

#[tokio::test]
async fn nonzero_exit_reports_stderr() {
    let client = server(r#"read -r line; echo boom >&2; exit 1"#);
    let outcome = client.get_me().await;
    assert_eq!(transport_kind(&outcome), Some(TransportErrorKind::ProcessExit));
    assert_eq!(
        outcome.to_string(),
        "MCP server process error (return code 1): boom"
    );
}

#[tokio::test]
async fn nonzero_exit_falls_back_to_stdout() {
    let client = server(r#"read -r line; echo oops; exit 1"#);
    let outcome = client.get_me().await;
    assert_eq!(
        outcome.to_string(),
        "MCP server process error (return code 1): oops"
    );
}

#[tokio::test]
async fn slow_server_times_out_and_is_killed() {
    let client = server_with_timeout(
        r#"echo 'pulling image' >&2; exec sleep 30"#,
        Duration::from_millis(300),
    );
    let started = Instant::now();
    let outcome = client.get_me().await;
    assert_eq!(transport_kind(&outcome), Some(TransportErrorKind::TimedOut));
    assert!(outcome.to_string().contains("pulling image"));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn lingering_grandchild_does_not_stretch_the_budget() {
    let client = server_with_timeout(
        r#"read -r line; sleep 0.3
echo '{"tool_result":{"result":{"login":"a","name":"A","id":1}}}'
(sleep 5 &)
exit 0"#,
        Duration::from_secs(1),
    );
    let started = Instant::now();
    let outcome = client.get_me().await;
    assert_eq!(outcome.to_string(), "Hello, a! Your name is A (via MCP).");
    assert!(started.elapsed() < Duration::from_millis(1300));
}

#[tokio::test]
async fn missing_runtime_is_launch_failure() {
    let client = StdioToolClient::from_launch(
        LaunchSpec {
            program: "no-such-container-runtime".into(),
            args: vec!["run".into()],
            env: vec![],
        },
        TIMEOUT,
    );
    let outcome = client.get_me().await;
    assert_eq!(transport_kind(&outcome), Some(TransportErrorKind::LaunchFailure));
}

#[tokio::test]
async fn parallel_sessions_are_independent() {
    let a = server(r#"read -r line; echo '{"tool_result":{"result":{"login":"a","id":1}}}'"#);
    let b = server(r#"read -r line; echo '{"tool_result":{"result":{"login":"b","id":2}}}'"#);
    let (ra, rb) = tokio::join!(a.get_me(), b.get_me());
    assert!(ra.to_string().starts_with("Hello, a!"));
    assert!(rb.to_string().starts_with("Hello, b!"));
}
