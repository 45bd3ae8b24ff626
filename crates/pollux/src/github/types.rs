//! GitHub API data types.

use serde::{Deserialize, Serialize};

/// Public GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Events requested per page (GitHub maximum).
pub const EVENTS_PER_PAGE: u32 = 100;

/// GitHub REST API version pinned in every request.
pub const API_VERSION: &str = "2022-11-28";

/// An entry of `GET /users/{user}/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubEvent {
    /// Event id; GitHub returns it as a string.
    pub id: String,
    /// Event type, e.g. "PushEvent".
    #[serde(rename = "type")]
    pub event_type: String,
    pub repo: GitHubEventRepo,
    #[serde(default)]
    pub payload: GitHubEventPayload,
    pub created_at: String,
    #[serde(default)]
    pub public: bool,
}

/// Repository reference embedded in an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubEventRepo {
    pub id: Option<i64>,
    /// "owner/name".
    pub name: String,
    /// API URL of the repository.
    pub url: String,
}

/// The subset of the event payload used for normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubEventPayload {
    /// Sub-action for issue/pull request style events ("opened", "closed").
    pub action: Option<String>,
    /// Number of commits in a push.
    pub size: Option<u64>,
    #[serde(default)]
    pub commits: Vec<serde_json::Value>,
}
