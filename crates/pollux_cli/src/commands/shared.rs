use std::sync::Arc;

use pollux::platform::EventSource;
#[cfg(any(feature = "github", feature = "gitlab"))]
use pollux::platform::{ApiRateLimiter, rate_limits};
use pollux::sync::PlatformSyncer;
use sea_orm::DatabaseConnection;

use crate::config::Config;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Event sources for every platform the configuration enables.
pub(crate) fn configured_sources(config: &Config) -> CliResult<Vec<Arc<dyn EventSource>>> {
    let mut sources: Vec<Arc<dyn EventSource>> = Vec::new();

    #[cfg(feature = "github")]
    if let Some(username) = &config.github.username {
        use pollux::github::GitHubClient;

        let rps = config
            .sync
            .requests_per_second
            .unwrap_or(rate_limits::GITHUB_DEFAULT_RPS);
        let mut client = GitHubClient::new(username.clone())?
            .with_token(config.github.token.clone())
            .with_rate_limiter(ApiRateLimiter::new(rps));
        if let Some(api_url) = &config.github.api_url {
            client = client.with_api_url(api_url.clone());
        }
        sources.push(Arc::new(client));
    }

    #[cfg(feature = "gitlab")]
    if let Some(user_id) = &config.gitlab.user_id {
        use pollux::gitlab::GitLabClient;

        let rps = config
            .sync
            .requests_per_second
            .unwrap_or(rate_limits::GITLAB_DEFAULT_RPS);
        let client = GitLabClient::new(user_id.clone())?
            .with_host(&config.gitlab_host())
            .with_token(config.gitlab.token.clone())
            .with_rate_limiter(ApiRateLimiter::new(rps));
        sources.push(Arc::new(client));
    }

    Ok(sources)
}

/// One syncer per configured platform, or only `only` when given.
pub(crate) fn build_syncers(
    db: &Arc<DatabaseConnection>,
    config: &Config,
    only: Option<&str>,
) -> CliResult<Vec<Arc<PlatformSyncer>>> {
    let sources = select_sources(configured_sources(config)?, only)?;
    let options = config.sync_options();

    Ok(sources
        .into_iter()
        .map(|source| Arc::new(PlatformSyncer::new(Arc::clone(db), source, options.clone())))
        .collect())
}

fn select_sources(
    sources: Vec<Arc<dyn EventSource>>,
    only: Option<&str>,
) -> CliResult<Vec<Arc<dyn EventSource>>> {
    if sources.is_empty() {
        return Err("No platforms configured: set github.username and/or gitlab.user_id".into());
    }

    let Some(only) = only else {
        return Ok(sources);
    };

    let selected: Vec<_> = sources
        .into_iter()
        .filter(|source| source.platform_name() == only)
        .collect();
    if selected.is_empty() {
        return Err(format!("Platform '{}' is not configured", only).into());
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use pollux::platform::{FetchResult, RawActivity};

    struct NamedSource(&'static str);

    #[async_trait]
    impl EventSource for NamedSource {
        fn platform_name(&self) -> &str {
            self.0
        }

        async fn fetch_since(
            &self,
            _since: Option<DateTime<Utc>>,
        ) -> pollux::platform::Result<FetchResult<Vec<RawActivity>>> {
            Ok(FetchResult::NotModified)
        }
    }

    fn sources() -> Vec<Arc<dyn EventSource>> {
        vec![Arc::new(NamedSource("github")), Arc::new(NamedSource("gitlab"))]
    }

    #[test]
    fn test_select_all_sources() {
        assert_eq!(select_sources(sources(), None).unwrap().len(), 2);
    }

    #[test]
    fn test_select_one_source() {
        let selected = select_sources(sources(), Some("gitlab")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].platform_name(), "gitlab");
    }

    #[test]
    fn test_select_unknown_source() {
        let err = select_sources(sources(), Some("gitea")).err().unwrap();
        assert!(err.to_string().contains("gitea"));
    }

    #[test]
    fn test_no_configured_platforms() {
        let config = Config::default();
        assert!(configured_sources(&config).unwrap().is_empty());
        assert!(select_sources(Vec::new(), None).is_err());
    }
}
