//! GitLab user events client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use tokio::sync::Mutex;

use super::convert::{placeholder_project, to_raw_activity};
use super::types::{DEFAULT_HOST, EVENTS_PER_PAGE, GitLabEvent, GitLabProject};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::platform::{
    self, ApiRateLimiter, EventSource, FetchResult, PaginationInfo, PlatformError, RawActivity,
};

/// Platform name GitLab activity is recorded under.
pub const PLATFORM_NAME: &str = "gitlab";

/// Upper bound on pages followed per fetch.
pub const DEFAULT_MAX_PAGES: u32 = 50;

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Event source for `GET /users/{id}/events`.
///
/// GitLab only filters by day (`after=<date>` is exclusive), so the window
/// starts the day before the checkpoint and the engine drops anything at or
/// before it. Project display fields come from `GET /projects/{id}`, cached
/// for the lifetime of the client.
#[derive(Clone)]
pub struct GitLabClient {
    transport: Arc<dyn HttpTransport>,
    platform_name: String,
    host: String,
    user_id: String,
    token: Option<String>,
    max_pages: u32,
    rate_limiter: Option<ApiRateLimiter>,
    projects: Arc<Mutex<HashMap<i64, GitLabProject>>>,
}

impl GitLabClient {
    /// Create a client for gitlab.com using the reqwest transport.
    pub fn new(user_id: impl Into<String>) -> platform::Result<Self> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?;
        Ok(Self::with_transport(Arc::new(transport), user_id))
    }

    /// Create a client on top of an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn HttpTransport>, user_id: impl Into<String>) -> Self {
        Self {
            transport,
            platform_name: PLATFORM_NAME.to_string(),
            host: DEFAULT_HOST.to_string(),
            user_id: user_id.into(),
            token: None,
            max_pages: DEFAULT_MAX_PAGES,
            rate_limiter: None,
            projects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Authenticate requests with a personal access token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Use a self-hosted instance. A missing scheme defaults to https.
    pub fn with_host(mut self, host: &str) -> Self {
        let host = host.trim().trim_end_matches('/');
        self.host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
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

    pub fn host(&self) -> &str {
        &self.host
    }

    /// URL of one events page.
    pub fn events_url(&self, since: Option<DateTime<Utc>>, page: u32) -> platform::Result<String> {
        let mut params = vec![
            ("sort", "asc".to_string()),
            ("per_page", EVENTS_PER_PAGE.to_string()),
        ];
        if let Some(after) = since.and_then(after_date) {
            params.push(("after", after));
        }
        params.push(("page", page.to_string()));

        let url = url::Url::parse_with_params(
            &format!("{}/api/v4/users/{}/events", self.host, self.user_id),
            &params,
        )
        .map_err(|e| PlatformError::internal(format!("invalid GitLab URL: {}", e)))?;
        Ok(url.to_string())
    }

    fn project_url(&self, project_id: i64) -> String {
        format!("{}/api/v4/projects/{}", self.host, project_id)
    }

    fn request(&self, url: &str) -> HttpRequest {
        let request = HttpRequest::get(url).header("Accept", "application/json");
        match &self.token {
            Some(token) => request.header("PRIVATE-TOKEN", token.clone()),
            None => request,
        }
    }

    async fn send(&self, request: HttpRequest) -> platform::Result<HttpResponse> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }
        Ok(self.transport.send(request).await?)
    }

    async fn fetch_events(&self, since: Option<DateTime<Utc>>) -> platform::Result<Vec<GitLabEvent>> {
        let resource = format!("users/{}/events", self.user_id);
        let mut events = Vec::new();
        let mut page = 1u32;

        loop {
            let url = self.events_url(since, page)?;
            let response = self.send(self.request(&url)).await?;
            if let Some(err) = PlatformError::from_response(&response, &resource) {
                return Err(err);
            }

            let batch: Vec<GitLabEvent> = serde_json::from_slice(&response.body)?;
            let pagination = PaginationInfo::from_page_headers(
                response.header("x-page"),
                response.header("x-total-pages"),
            );
            let next_page = pagination.next_page.or_else(|| {
                response
                    .header("x-next-page")
                    .and_then(|p| p.trim().parse::<u32>().ok())
            });

            tracing::debug!(
                platform = %self.platform_name,
                page,
                count = batch.len(),
                total_pages = ?pagination.total_pages,
                "Fetched GitLab events page"
            );
            let empty_page = batch.is_empty();
            events.extend(batch);

            match next_page {
                Some(next) if !empty_page && next > page && page < self.max_pages => page = next,
                Some(_) if page >= self.max_pages => {
                    tracing::warn!(
                        platform = %self.platform_name,
                        max_pages = self.max_pages,
                        "Stopping GitLab pagination at page limit"
                    );
                    break;
                }
                _ => break,
            }
        }

        Ok(events)
    }

    /// Look up project display fields, serving repeats from the cache.
    ///
    /// Projects the API reports as missing (deleted, private) get a
    /// placeholder that is not cached.
    pub async fn project(&self, project_id: i64) -> platform::Result<GitLabProject> {
        if let Some(project) = self.projects.lock().await.get(&project_id) {
            return Ok(project.clone());
        }

        let response = self.send(self.request(&self.project_url(project_id))).await?;
        match PlatformError::from_response(&response, &format!("projects/{}", project_id)) {
            Some(PlatformError::NotFound { .. }) => {
                tracing::debug!(project_id, "GitLab project not found, using placeholder");
                return Ok(placeholder_project(&self.host, project_id));
            }
            Some(err) => return Err(err),
            None => {}
        }

        let project: GitLabProject = serde_json::from_slice(&response.body)?;
        self.projects
            .lock()
            .await
            .insert(project_id, project.clone());
        Ok(project)
    }
}

/// `after` is exclusive and day-granular: ask for everything from the
/// checkpoint's day onwards.
fn after_date(since: DateTime<Utc>) -> Option<String> {
    since
        .date_naive()
        .checked_sub_days(Days::new(1))
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[async_trait]
impl EventSource for GitLabClient {
    fn platform_name(&self) -> &str {
        &self.platform_name
    }

    async fn fetch_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> platform::Result<FetchResult<Vec<RawActivity>>> {
        let events = self.fetch_events(since).await?;

        let mut projects: HashMap<i64, GitLabProject> = HashMap::new();
        for project_id in events.iter().filter_map(|e| e.project_id) {
            if !projects.contains_key(&project_id) {
                let project = self.project(project_id).await?;
                projects.insert(project_id, project);
            }
        }

        let activities = events
            .iter()
            .map(|event| {
                let project = event.project_id.and_then(|id| projects.get(&id));
                to_raw_activity(event, project)
            })
            .collect();

        Ok(FetchResult::Fetched {
            data: activities,
            etag: None,
        })
    }
}
