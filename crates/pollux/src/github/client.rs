//! GitHub user events client.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::convert::{to_raw_activity, web_base_url};
use super::types::{API_VERSION, DEFAULT_API_URL, EVENTS_PER_PAGE, GitHubEvent};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::platform::{
    self, ApiRateLimiter, EventSource, FetchResult, PlatformError, RawActivity, parse_timestamp,
};

/// Platform name GitHub activity is recorded under.
pub const PLATFORM_NAME: &str = "github";

/// Upper bound on pages followed per fetch.
pub const DEFAULT_MAX_PAGES: u32 = 10;

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Pagination links extracted from GitHub's Link header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// URL of the next page (from rel="next").
    pub next_url: Option<String>,
}

/// Parse the Link header.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/user/1/events?per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';').map(str::trim) {
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some("next")) = (url, rel) {
            info.next_url = Some(url.to_string());
        }
    }

    info
}


/// Event source for `GET /users/{username}/events`.
///
/// Pages are followed via the Link header until a page reaches events at or
/// before the requested checkpoint. The first page is requested with the last
/// acknowledged ETag so an unchanged feed costs a single 304.
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    platform_name: String,
    username: String,
    token: Option<String>,
    api_url: String,
    web_url: String,
    max_pages: u32,
    rate_limiter: Option<ApiRateLimiter>,
    etag: Mutex<Option<String>>,
}

impl GitHubClient {
    /// Create a client using the reqwest transport.
    pub fn new(username: impl Into<String>) -> platform::Result<Self> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?;
        Ok(Self::with_transport(Arc::new(transport), username))
    }

    /// Create a client on top of an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn HttpTransport>, username: impl Into<String>) -> Self {
        Self {
            transport,
            platform_name: PLATFORM_NAME.to_string(),
            username: username.into(),
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            web_url: web_base_url(DEFAULT_API_URL),
            max_pages: DEFAULT_MAX_PAGES,
            rate_limiter: None,
            etag: Mutex::new(None),
        }
    }

    /// Authenticate requests with a personal access token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Point the client at a different API (e.g. GitHub Enterprise).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self.web_url = web_base_url(&self.api_url);
        self
    }

    /// Record activity under another platform name.
    pub fn with_platform_name(mut self, name: impl Into<String>) -> Self {
        self.platform_name = name.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Throttle requests through a shared rate limiter.
    pub fn with_rate_limiter(mut self, limiter: ApiRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// URL of the first events page.
    pub fn events_url(&self) -> platform::Result<String> {
        let url = url::Url::parse_with_params(
            &format!("{}/users/{}/events", self.api_url, self.username),
            &[("per_page", EVENTS_PER_PAGE.to_string())],
        )
        .map_err(|e| PlatformError::internal(format!("invalid GitHub API URL: {}", e)))?;
        Ok(url.to_string())
    }

    fn acknowledged_etag(&self) -> Option<String> {
        self.etag
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn request(&self, url: &str) -> HttpRequest {
        let request = HttpRequest::get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: HttpRequest) -> platform::Result<HttpResponse> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }
        Ok(self.transport.send(request).await?)
    }
}

/// Whether any event on the page is at or before the checkpoint.
fn page_reaches(events: &[GitHubEvent], since: Option<DateTime<Utc>>) -> bool {
    let Some(since) = since else {
        return false;
    };
    events
        .iter()
        .filter_map(|e| parse_timestamp(&e.created_at))
        .any(|t| t <= since)
}

#[async_trait]
impl EventSource for GitHubClient {
    fn platform_name(&self) -> &str {
        &self.platform_name
    }

    async fn fetch_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> platform::Result<FetchResult<Vec<RawActivity>>> {
        let resource = format!("users/{}/events", self.username);
        let cached_etag = self.acknowledged_etag();

        let mut next_url = Some(self.events_url()?);
        let mut page = 1u32;
        let mut first_etag = None;
        let mut activities = Vec::new();

        while let Some(url) = next_url.take() {
            let mut request = self.request(&url);
            if page == 1
                && let Some(etag) = cached_etag.as_deref()
            {
                request = request.header("If-None-Match", etag);
            }

            let response = self.send(request).await?;

            if response.status == 304 {
                tracing::debug!(platform = %self.platform_name, page, "GitHub events not modified");
                if page == 1 {
                    return Ok(FetchResult::NotModified);
                }
                break;
            }
            if let Some(err) = PlatformError::from_response(&response, &resource) {
                return Err(err);
            }

            if page == 1 {
                first_etag = response.header("etag").map(String::from);
            }

            let events: Vec<GitHubEvent> = serde_json::from_slice(&response.body)?;
            let reached_checkpoint = page_reaches(&events, since);
            activities.extend(events.iter().map(|e| to_raw_activity(e, &self.web_url)));

            tracing::debug!(
                platform = %self.platform_name,
                page,
                count = events.len(),
                total = activities.len(),
                "Fetched GitHub events page"
            );

            if reached_checkpoint || events.is_empty() {
                break;
            }
            if page >= self.max_pages {
                tracing::warn!(
                    platform = %self.platform_name,
                    max_pages = self.max_pages,
                    "Stopping GitHub pagination at page limit"
                );
                break;
            }

            next_url = response
                .header("link")
                .and_then(|link| parse_link_header(link).next_url);
            page += 1;
        }

        Ok(FetchResult::Fetched {
            data: activities,
            etag: first_etag,
        })
    }

    fn acknowledge(&self, etag: Option<&str>) {
        if let Some(etag) = etag {
            *self
                .etag
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(etag.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockTransport;
    use chrono::TimeZone;
    use serde_json::json;

    const FIRST_PAGE: &str = "https://api.github.com/users/octocat/events?per_page=100";
    const SECOND_PAGE: &str = "https://api.github.com/users/octocat/events?per_page=100&page=2";

    fn event(id: &str, event_type: &str, action: Option<&str>, created_at: &str) -> serde_json::Value {
        let mut payload = json!({});
        if let Some(action) = action {
            payload["action"] = json!(action);
        }
        json!({
            "id": id,
            "type": event_type,
            "repo": {
                "id": 42,
                "name": "octocat/hello-world",
                "url": "https://api.github.com/repos/octocat/hello-world"
            },
            "payload": payload,
            "public": true,
            "created_at": created_at
        })
    }

    fn client(transport: &MockTransport) -> GitHubClient {
        GitHubClient::with_transport(Arc::new(transport.clone()), "octocat")
            .with_token(Some("secret".to_string()))
    }

    #[test]
    fn test_parse_link_header() {
        let header = format!(
            "<{}>; rel=\"next\", <https://api.github.com/users/octocat/events?per_page=100&page=3>; rel=\"last\"",
            SECOND_PAGE
        );
        let info = parse_link_header(&header);
        assert_eq!(info.next_url.as_deref(), Some(SECOND_PAGE));
    }

    #[test]
    fn test_parse_link_header_without_next() {
        let info = parse_link_header(
            "<https://api.github.com/users/octocat/events?page=1>; rel=\"first\"",
        );
        assert_eq!(info, LinkPagination::default());
    }

    #[test]
    fn test_events_url() {
        let transport = MockTransport::new();
        assert_eq!(client(&transport).events_url().unwrap(), FIRST_PAGE);

        let enterprise = client(&transport).with_api_url("https://ghe.example.com/api/v3/");
        assert_eq!(
            enterprise.events_url().unwrap(),
            "https://ghe.example.com/api/v3/users/octocat/events?per_page=100"
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_auth_headers_and_converts_events() {
        let transport = MockTransport::new();
        transport.push_json(
            FIRST_PAGE,
            200,
            &[("ETag", "\"v1\"")],
            json!([
                event("2", "PullRequestEvent", Some("opened"), "2024-01-01T00:00:20Z"),
                event("1", "PushEvent", None, "2024-01-01T00:00:10Z"),
            ]),
        );

        let client = client(&transport);
        let result = client.fetch_since(None).await.unwrap();

        assert_eq!(result.etag(), Some("\"v1\""));
        let data = result.into_data().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].action, "pull_request.opened");
        assert_eq!(data[1].action, "push");
        assert_eq!(data[1].project_url, "https://github.com/octocat/hello-world");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header_value("authorization"), Some("Bearer secret"));
        assert_eq!(requests[0].header_value("x-github-api-version"), Some(API_VERSION));
        assert!(requests[0].header_value("if-none-match").is_none());
    }

    #[tokio::test]
    async fn test_fetch_follows_link_header() {
        let transport = MockTransport::new();
        let link = format!("<{}>; rel=\"next\"", SECOND_PAGE);
        transport.push_json(
            FIRST_PAGE,
            200,
            &[("Link", link.as_str())],
            json!([event("3", "PushEvent", None, "2024-01-03T00:00:00Z")]),
        );
        transport.push_json(
            SECOND_PAGE,
            200,
            &[],
            json!([event("2", "PushEvent", None, "2024-01-02T00:00:00Z")]),
        );

        let data = client(&transport)
            .fetch_since(None)
            .await
            .unwrap()
            .into_data()
            .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_stops_once_page_reaches_checkpoint() {
        let transport = MockTransport::new();
        let link = format!("<{}>; rel=\"next\"", SECOND_PAGE);
        transport.push_json(
            FIRST_PAGE,
            200,
            &[("Link", link.as_str())],
            json!([
                event("3", "PushEvent", None, "2024-01-03T00:00:00Z"),
                event("2", "PushEvent", None, "2024-01-01T00:00:00Z"),
            ]),
        );

        let since = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let data = client(&transport)
            .fetch_since(Some(since))
            .await
            .unwrap()
            .into_data()
            .unwrap();

        // The older item is still returned; the engine filters by checkpoint.
        assert_eq!(data.len(), 2);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_etag_used_only_after_acknowledge() {
        let transport = MockTransport::new();
        transport.push_json(FIRST_PAGE, 200, &[("ETag", "\"v1\"")], json!([]));
        transport.push_json(FIRST_PAGE, 200, &[("ETag", "\"v1\"")], json!([]));
        transport.push_json(FIRST_PAGE, 304, &[], json!(null));

        let client = client(&transport);

        let first = client.fetch_since(None).await.unwrap();
        let second = client.fetch_since(None).await.unwrap();
        assert!(!second.is_not_modified());

        client.acknowledge(first.etag());
        let third = client.fetch_since(None).await.unwrap();
        assert!(third.is_not_modified());

        let requests = transport.requests();
        assert!(requests[1].header_value("if-none-match").is_none());
        assert_eq!(requests[2].header_value("if-none-match"), Some("\"v1\""));
    }

    #[tokio::test]
    async fn test_fetch_maps_error_statuses() {
        let transport = MockTransport::new();
        transport.push_json(FIRST_PAGE, 401, &[], json!({"message": "Bad credentials"}));
        transport.push_json(FIRST_PAGE, 503, &[], json!({"message": "unavailable"}));
        transport.push_transport_error(FIRST_PAGE, "connection reset");

        let client = client(&transport);
        let auth = client.fetch_since(None).await.unwrap_err();
        assert!(matches!(auth, PlatformError::AuthRequired));
        assert!(!auth.is_transient());

        let server = client.fetch_since(None).await.unwrap_err();
        assert!(server.is_transient());

        let network = client.fetch_since(None).await.unwrap_err();
        assert!(matches!(network, PlatformError::Network { .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_body() {
        let transport = MockTransport::new();
        transport.push_json(FIRST_PAGE, 200, &[], json!({"not": "a list"}));

        let err = client(&transport).fetch_since(None).await.unwrap_err();
        assert!(matches!(err, PlatformError::Deserialize { .. }));
    }
}
