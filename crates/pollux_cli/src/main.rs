//! Pollux CLI - command-line front end for the activity aggregator.

mod commands;
mod config;
mod progress;
mod shutdown;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pollux")]
#[command(version)]
#[command(about = "Aggregates source-control activity into one event log")]
#[command(
    long_about = "Pollux periodically polls the activity feeds of a user on several code \
hosting platforms (GitHub, GitLab), normalizes every item into a canonical action and \
appends it to a local event log with a per-platform checkpoint."
)]
#[command(after_long_help = r#"EXAMPLES
    Create or upgrade the database:
        $ pollux migrate up

    Run one cycle for every configured platform:
        $ pollux sync

    Keep polling until Ctrl+C:
        $ pollux run

CONFIGURATION
    Pollux reads configuration from:
      1. ~/.config/pollux/config.toml (or $XDG_CONFIG_HOME/pollux/config.toml)
      2. ./pollux.toml
      3. Environment variables (POLLUX_* prefix, e.g., POLLUX_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    POLLUX_DATABASE_URL       Database connection string (default: ~/.local/state/pollux/pollux.db)
    POLLUX_GITHUB_USERNAME    GitHub user to follow (legacy: GITHUB_USERNAME)
    POLLUX_GITHUB_TOKEN       GitHub personal access token (legacy: GITHUB_API_TOKEN)
    POLLUX_GITLAB_USER_ID     GitLab user to follow (legacy: GITLAB_USER_ID)
    POLLUX_GITLAB_TOKEN       GitLab personal access token (legacy: GITLAB_API_TOKEN)
    POLLUX_GITLAB_HOST        GitLab host (default: gitlab.com)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Inspect and manage registered platforms
    Platforms {
        #[command(subcommand)]
        action: PlatformsAction,
    },
    /// Run one sync cycle for every configured platform
    Sync {
        /// Only sync this platform
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// Sync periodically until interrupted
    Run {
        /// Seconds between cycles (default from config or 300)
        #[arg(short, long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Drop all tables and reapply migrations
    Fresh {
        /// Confirm dropping the event log
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PlatformsAction {
    /// List platforms with their checkpoint
    List,
    /// Register a platform with an empty checkpoint
    Register {
        /// Platform name (e.g. "github")
        name: String,
    },
    /// Remove a platform with all of its projects and events
    ///
    /// A running `pollux run` does not re-create it; its cycles fail until
    /// the scheduler is restarted.
    Remove {
        /// Platform name
        name: String,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("pollux=info,pollux_cli=info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set POLLUX_DATABASE_URL")?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        // Warn if using a relative path (can cause issues depending on cwd)
        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Platforms { action } => {
            commands::platforms::handle_platforms(action, &database_url).await?;
        }
        Commands::Sync { platform } => {
            commands::sync::handle_sync(platform, &config, &database_url).await?;
        }
        Commands::Run { interval_secs } => {
            commands::sync::handle_run(interval_secs, &config, &database_url).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_with_platform() {
        let cli = Cli::try_parse_from(["pollux", "sync", "--platform", "gitlab"]).unwrap();
        match cli.command {
            Commands::Sync { platform } => assert_eq!(platform.as_deref(), Some("gitlab")),
            _ => panic!("expected sync command"),
        }
    }

    #[test]
    fn test_parse_platforms_remove_requires_name() {
        assert!(Cli::try_parse_from(["pollux", "platforms", "remove"]).is_err());
        let cli = Cli::try_parse_from(["pollux", "platforms", "remove", "github", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Platforms {
                action: PlatformsAction::Remove { yes: true, .. }
            }
        ));
    }
}
