use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Granularity;

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gitlab: GitLabConfig,
    pub powerbi: PowerBiConfig,
    pub report: ReportConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/commit-lifetime/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("commit-lifetime")
            .join("config.toml")
    }
}

/// Source-control API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// Base URL of the GitLab instance (without `/api/v4`).
    pub url: String,
    /// Private access token, sent as `PRIVATE-TOKEN`.
    pub token: Option<String>,
    /// Environment variable consulted when `token` is unset.
    pub token_env: Option<String>,
    /// Only merge requests into these branches are counted.
    pub target_branches: Vec<String>,
    /// Items requested per page when listing.
    pub page_size: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            url: "https://git.jpg.com".into(),
            token: None,
            token_env: Some("GITLAB_TOKEN".into()),
            target_branches: vec!["master".into(), "main".into()],
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

impl GitLabConfig {
    /// Token from config, else from the configured environment variable.
    pub fn resolved_token(&self) -> Option<String> {
        self.token.clone().or_else(|| {
            self.token_env
                .as_ref()
                .and_then(|env_var| std::env::var(env_var).ok())
        })
    }
}

/// Streaming dataset settings. Publishing is skipped when `push_url` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerBiConfig {
    /// Push URL of the streaming dataset, including its key.
    pub push_url: Option<String>,
    /// Delete all existing rows before pushing.
    pub clear: bool,
    /// Azure AD tenant the app registration lives in.
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Environment variable consulted when `client_secret` is unset.
    pub client_secret_env: Option<String>,
    /// Power BI workspace (REST "group") holding the dataset.
    pub workspace_id: Option<String>,
    /// Table rows are deleted from when clearing.
    pub table: String,
    pub authority_host: String,
    pub resource: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for PowerBiConfig {
    fn default() -> Self {
        Self {
            push_url: None,
            clear: false,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            client_secret_env: Some("POWERBI_CLIENT_SECRET".into()),
            workspace_id: None,
            table: "RealTimeData".into(),
            authority_host: "https://login.microsoftonline.com".into(),
            resource: "https://analysis.windows.net/powerbi/api".into(),
            api_base: "https://api.powerbi.com/v1.0/myorg".into(),
            timeout_secs: 30,
        }
    }
}

impl PowerBiConfig {
    pub fn resolved_client_secret(&self) -> Option<String> {
        self.client_secret.clone().or_else(|| {
            self.client_secret_env
                .as_ref()
                .and_then(|env_var| std::env::var(env_var).ok())
        })
    }

    /// Whether a clear was asked for and there is a dataset to clear.
    pub fn clear_requested(&self) -> bool {
        self.clear && self.push_url.is_some()
    }
}

/// Report window and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Inclusive lower bound on merge time (ISO 8601).
    pub after: String,
    /// Inclusive upper bound on merge time (ISO 8601).
    pub before: Option<String>,
    /// CSV output path.
    pub output: PathBuf,
    pub granularity: Granularity,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            after: "2021-02-01T00:00:00.0000Z".into(),
            before: None,
            output: PathBuf::from("commit_lifetime.csv"),
            granularity: Granularity::Day,
        }
    }
}

/// Split a comma-separated branch list, dropping blanks.
pub fn parse_branch_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(String::from)
        .collect()
}
