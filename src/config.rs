//! Agent configuration loading and validation.
//!
//! Reads an optional YAML file and resolves `${VAR}` / `${VAR:-default}`
//! references before parsing. Credentials never live in the file; they are
//! read once from the environment into [`Credentials`] and passed explicitly
//! to the clients that need them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::mcp_client::types::GITHUB_TOKEN_ENV;
use crate::mcp_client::{McpServerSettings, Secret};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "MCP_REVIEW_AGENT_CONFIG";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mcp-review-agent.yaml";

/// Env var holding the generative-review API key.
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A credential needed by the requested operation is not set.
    #[error("{var} environment variable not set.")]
    MissingCredential { var: &'static str },

    /// The config file exists but could not be read.
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    /// The config file is not valid YAML for this schema.
    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    /// A value parsed but is out of range.
    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

// ─── Public Types ────────────────────────────────────────────────────────────

/// Tool server launch settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub runtime: String,
    pub image: String,
    pub timeout_secs: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            runtime: "docker".into(),
            image: "ghcr.io/github/github-mcp-server".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub api_base: String,
    pub model: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-1.5-flash".into(),
        }
    }
}

/// Top-level agent configuration (mirrors `mcp-review-agent.yaml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub mcp: McpConfig,
    pub github: GitHubConfig,
    pub review: ReviewConfig,
    /// Write logs here instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl AgentConfig {
    /// Check values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mcp.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "mcp.timeout_secs must be greater than zero".into(),
            });
        }
        if self.mcp.runtime.trim().is_empty() || self.mcp.image.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "mcp.runtime and mcp.image must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Launch settings for the stdio tool client.
    pub fn mcp_settings(&self) -> McpServerSettings {
        McpServerSettings {
            runtime: self.mcp.runtime.clone(),
            image: self.mcp.image.clone(),
            timeout: Duration::from_secs(self.mcp.timeout_secs),
        }
    }
}

/// Credentials read from the environment at startup.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub github_token: Option<Secret>,
    pub gemini_api_key: Option<Secret>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            github_token: read_secret(GITHUB_TOKEN_ENV),
            gemini_api_key: read_secret(GEMINI_KEY_ENV),
        }
    }

    pub fn require_github_token(&self) -> Result<Secret, ConfigError> {
        self.github_token
            .clone()
            .ok_or(ConfigError::MissingCredential {
                var: GITHUB_TOKEN_ENV,
            })
    }

    pub fn require_gemini_api_key(&self) -> Result<Secret, ConfigError> {
        self.gemini_api_key
            .clone()
            .ok_or(ConfigError::MissingCredential { var: GEMINI_KEY_ENV })
    }
}

fn read_secret(var: &str) -> Option<Secret> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(Secret::new)
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Pick the config file: explicit path, then env var, then the working
/// directory default. Returns `None` when no file applies.
pub fn find_config_path(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let candidate = cwd.join(DEFAULT_CONFIG_FILE);
    candidate.exists().then_some(candidate)
}

/// Load and validate the config at `path`.
pub fn load_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_config(&raw)
}

/// A config and the file it was read from (`None` for built-in defaults).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AgentConfig,
    pub source: Option<PathBuf>,
}

/// Load the config if a file applies, defaults otherwise.
///
/// Runs before logging is set up, so the caller reports `source` once the
/// subscriber is installed.
pub fn load_or_default(
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<LoadedConfig, ConfigError> {
    let source = find_config_path(explicit, cwd);
    let config = match &source {
        Some(path) => load_config(path)?,
        None => AgentConfig::default(),
    };
    Ok(LoadedConfig { config, source })
}

fn parse_config(raw: &str) -> Result<AgentConfig, ConfigError> {
    let interpolated = interpolate_env_vars(raw);

    // An empty file is a valid "all defaults" config.
    let config: AgentConfig = if interpolated.trim().is_empty() {
        AgentConfig::default()
    } else {
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?
    };

    config.validate()?;
    Ok(config)
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string. An unterminated
/// `${` is left as written.
fn interpolate_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let Some(close) = reference.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(&resolve_var_expr(&reference[..close]));
        rest = &reference[close + 1..];
    }

    out.push_str(rest);
    out
}

/// `VAR` resolves to its value or ""; `VAR:-fallback` to its value or the
/// tilde-expanded fallback.
fn resolve_var_expr(expr: &str) -> String {
    let (name, fallback) = match expr.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (expr, None),
    };
    match (std::env::var(name), fallback) {
        (Ok(value), _) => value,
        (Err(_), Some(fallback)) => expand_tilde(fallback),
        (Err(_), None) => String::new(),
    }
}

/// `~` and `~/...` become paths under the home directory; `~user` is kept.
fn expand_tilde(path: &str) -> String {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{rest}", home.display())
        }
        _ => path.to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
