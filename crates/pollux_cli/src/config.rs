//! Configuration file support for pollux.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `POLLUX_`, e.g., `POLLUX_DATABASE_URL`)
//! 3. Config file (./pollux.toml, then ~/.config/pollux/config.toml)
//! 4. Legacy environment variables (`GITHUB_API_TOKEN`, `GITLAB_USER_ID`, ...)
//! 5. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/pollux/pollux.db` on Linux
//! (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/pollux/pollux.db"  # optional, this is the default
//!
//! [github]
//! username = "octocat"
//! token = "ghp_..."  # or use POLLUX_GITHUB_TOKEN env var
//!
//! [gitlab]
//! host = "gitlab.com"  # or self-hosted instance
//! user_id = "1234"
//! token = "glpat-..."  # or use POLLUX_GITLAB_TOKEN env var
//!
//! [sync]
//! interval_secs = 300
//! cycle_timeout_secs = 120
//! max_retries = 3
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{
    Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError, Environment, File, FileFormat,
};
use directories::ProjectDirs;
use pollux::retry::RetryConfig;
use pollux::sync::{
    DEFAULT_CYCLE_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_SYNC_INTERVAL_SECS,
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, SyncOptions,
};
use serde::Deserialize;

/// Multi-word keys the `_`-separated environment source cannot express.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("POLLUX_GITHUB_API_URL", "github.api_url"),
    ("POLLUX_GITLAB_USER_ID", "gitlab.user_id"),
    ("POLLUX_SYNC_INTERVAL_SECS", "sync.interval_secs"),
    ("POLLUX_SYNC_CYCLE_TIMEOUT_SECS", "sync.cycle_timeout_secs"),
    ("POLLUX_SYNC_MAX_RETRIES", "sync.max_retries"),
    ("POLLUX_SYNC_MIN_BACKOFF_MS", "sync.min_backoff_ms"),
    ("POLLUX_SYNC_MAX_BACKOFF_MS", "sync.max_backoff_ms"),
    ("POLLUX_SYNC_REQUESTS_PER_SECOND", "sync.requests_per_second"),
];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// GitHub configuration.
    pub github: GitHubConfig,
    /// GitLab configuration.
    pub gitlab: GitLabConfig,
    /// Sync scheduling options.
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// GitHub configuration. The platform is enabled once `username` is set.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// User whose public activity is collected.
    pub username: Option<String>,
    /// GitHub API token.
    pub token: Option<String>,
    /// API base URL, for GitHub Enterprise.
    pub api_url: Option<String>,
}

/// GitLab configuration. The platform is enabled once `user_id` is set.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// GitLab host (e.g., "gitlab.com" or "https://gitlab.example.com").
    pub host: Option<String>,
    /// Numeric id or username of the user whose activity is collected.
    pub user_id: Option<String>,
    /// GitLab API token (personal access token).
    pub token: Option<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            host: Some("gitlab.com".to_string()),
            user_id: None,
            token: None,
        }
    }
}

/// Sync scheduling options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between two cycles of a platform.
    pub interval_secs: u64,
    /// Upper bound for one fetch.
    pub cycle_timeout_secs: u64,
    /// Retries of a transiently failed cycle.
    pub max_retries: usize,
    pub min_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Proactive API rate limit; platform default when unset.
    pub requests_per_second: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            cycle_timeout_secs: DEFAULT_CYCLE_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            min_backoff_ms: INITIAL_BACKOFF_MS,
            max_backoff_ms: MAX_BACKOFF_MS,
            requests_per_second: None,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/pollux/config.toml)
    /// 3. Local config file (./pollux.toml)
    /// 4. Environment variables with POLLUX_ prefix
    ///
    /// Legacy environment variables fill whatever is still unset.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        // Add XDG config file if it exists
        if let Some(config_path) = Self::default_config_path()
            && config_path.exists()
        {
            tracing::debug!("Loading config from {:?}", config_path);
            builder = builder.add_source(
                File::from(config_path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // Add local config file (higher priority than XDG)
        let local_config = PathBuf::from("pollux.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./pollux.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., POLLUX_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("POLLUX")
                .separator("_")
                .try_parsing(true),
        );
        let built = with_env_overrides(builder, |key| std::env::var(key).ok())
            .and_then(|builder| builder.build());

        let mut config = match built {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        };

        config.apply_legacy_env(|key| std::env::var(key).ok());
        config
    }

    /// Fill unset values from the variables older deployments used.
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value.filter(|v| !v.trim().is_empty());
            }
        }

        fill(&mut self.github.token, lookup("GITHUB_API_TOKEN"));
        fill(&mut self.github.username, lookup("GITHUB_USERNAME"));
        fill(&mut self.gitlab.token, lookup("GITLAB_API_TOKEN"));
        fill(&mut self.gitlab.user_id, lookup("GITLAB_USER_ID"));
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("pollux.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the GitLab host.
    pub fn gitlab_host(&self) -> String {
        self.gitlab
            .host
            .clone()
            .unwrap_or_else(|| "gitlab.com".to_string())
    }

    /// Time between two cycles of a platform.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs.max(1))
    }

    /// Engine options derived from the `[sync]` section.
    pub fn sync_options(&self) -> SyncOptions {
        let sync = &self.sync;
        SyncOptions {
            cycle_timeout: Duration::from_secs(sync.cycle_timeout_secs.max(1)),
            retry: RetryConfig::new(
                Duration::from_millis(sync.min_backoff_ms),
                Duration::from_millis(sync.max_backoff_ms.max(sync.min_backoff_ms)),
                sync.max_retries,
            ),
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pollux").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/pollux` or `~/.local/state/pollux`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pollux").map(|dirs| {
            // state_dir() returns None on macOS/Windows, fall back to data_dir
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

fn with_env_overrides(
    mut builder: Builder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Builder<DefaultState>, ConfigError> {
    for (var, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(*key, value)?;
        }
    }
    Ok(builder)
}
