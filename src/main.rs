use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use mcp_review_agent::config::{self, AgentConfig, ConfigError, Credentials, LoadedConfig};
use mcp_review_agent::github::{GitHubClient, PullRequestRef};
use mcp_review_agent::mcp_client::StdioToolClient;
use mcp_review_agent::review::ReviewClient;

#[derive(Parser)]
#[command(name = "mcp-review-agent")]
#[command(version, about = "Pull-request review agent with a stdio MCP tool client")]
#[command(long_about = "Talks to a containerized MCP tool server over stdio and reviews \
GitHub pull requests with a generative-language API.\n\n\
Environment Variables:\n\
  GITHUB_PERSONAL_ACCESS_TOKEN   Repository access token (whoami, call, review)\n\
  GEMINI_API_KEY                 Review generation key (review)\n\
  MCP_REVIEW_AGENT_CONFIG        Path to a YAML config file (optional)\n\
  RUST_LOG                       Log filter (optional)")]
struct Cli {
    /// Path to a YAML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the tool server timeout in seconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the tool server who the token belongs to.
    Whoami,
    /// Invoke an arbitrary tool once.
    Call {
        /// Tool name, e.g. `get_me`.
        tool: String,
        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Review a pull request.
    Review {
        /// Pull request URL, e.g. https://github.com/owner/repo/pull/1
        url: String,
        /// Post the review as a comment on the pull request.
        #[arg(long)]
        post: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let LoadedConfig { config, source } = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => return config_failure(&e),
    };

    if let Err(e) = mcp_review_agent::init_tracing(config.log_file.as_deref()) {
        eprintln!("warning: could not open log file: {e}");
    }

    match &source {
        Some(path) => tracing::debug!(path = %path.display(), "config loaded"),
        None => tracing::debug!("no config file found; using defaults"),
    }

    let credentials = Credentials::from_env();

    let result = match cli.command {
        Command::Whoami => whoami(&config, &credentials).await,
        Command::Call { tool, args } => call(&config, &credentials, &tool, &args).await,
        Command::Review { url, post } => review(&config, &credentials, &url, post).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => match e.downcast_ref::<ConfigError>() {
            Some(config_error) => config_failure(config_error),
            None => {
                eprintln!("\n--- Agent Run Failed ---");
                eprintln!("{e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn load_config(cli: &Cli) -> Result<LoadedConfig, ConfigError> {
    let cwd = std::env::current_dir().unwrap_or_default();
    let mut loaded = config::load_or_default(cli.config.as_deref(), &cwd)?;
    if let Some(secs) = cli.timeout {
        loaded.config.mcp.timeout_secs = secs;
    }
    Ok(loaded)
}

fn config_failure(e: &ConfigError) -> ExitCode {
    eprintln!("\n--- Configuration Error ---");
    eprintln!("{e}");
    ExitCode::from(2)
}

async fn whoami(config: &AgentConfig, credentials: &Credentials) -> anyhow::Result<bool> {
    let token = credentials.require_github_token()?;
    let client = StdioToolClient::new(&config.mcp_settings(), token);

    eprintln!(
        "Running '{}' via {} (timeout {}s); the first run may pull the image.",
        config.mcp.image, config.mcp.runtime, config.mcp.timeout_secs
    );

    let outcome = client.get_me().await;
    println!("{outcome}");
    Ok(outcome.is_success())
}

async fn call(
    config: &AgentConfig,
    credentials: &Credentials,
    tool: &str,
    args: &str,
) -> anyhow::Result<bool> {
    let token = credentials.require_github_token()?;
    let arguments: serde_json::Value =
        serde_json::from_str(args).context("--args must be valid JSON")?;
    anyhow::ensure!(arguments.is_object(), "--args must be a JSON object");

    let client = StdioToolClient::new(&config.mcp_settings(), token);
    let outcome = client.invoke(tool, &arguments).await;
    println!("{outcome}");
    Ok(outcome.is_success())
}

async fn review(
    config: &AgentConfig,
    credentials: &Credentials,
    url: &str,
    post: bool,
) -> anyhow::Result<bool> {
    // Check every credential up front so nothing is fetched on a doomed run.
    let github_token = credentials.require_github_token()?;
    let gemini_key = credentials.require_gemini_api_key()?;

    let pr = PullRequestRef::parse(url)?;
    let github = GitHubClient::new(&config.github.api_base, github_token)?;
    let reviewer = ReviewClient::new(&config.review.api_base, &config.review.model, gemini_key)?;

    let details = github
        .fetch_pull_request(&pr)
        .await
        .with_context(|| format!("failed to fetch {pr}"))?;

    let review_text = reviewer
        .generate_review(&details)
        .await
        .with_context(|| format!("failed to generate a review with {}", reviewer.model()))?;

    println!("{review_text}");

    if !post {
        return Ok(true);
    }

    match github.post_comment(&pr, &review_text).await {
        Ok(()) => {
            eprintln!("Review posted to {pr}.");
            Ok(true)
        }
        Err(e) => {
            eprintln!("Failed to post review comment: {e}");
            Ok(false)
        }
    }
}
