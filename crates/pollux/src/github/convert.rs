//! Conversion from GitHub events to platform-agnostic activity.

use crate::platform::{RawActivity, dotted_action, to_snake_case};

use super::types::{DEFAULT_API_URL, GitHubEvent};

/// Canonical action for a GitHub event.
///
/// The `Event` suffix is dropped from the type and the rest snake_cased;
/// a payload sub-action is appended with a dot.
///
/// - `PushEvent` → `push`
/// - `PullRequestEvent` + `opened` → `pull_request.opened`
/// - `IssueCommentEvent` + `created` → `issue_comment.created`
pub fn canonical_action(event: &GitHubEvent) -> String {
    let base = event
        .event_type
        .strip_suffix("Event")
        .unwrap_or(&event.event_type);
    dotted_action(&to_snake_case(base), event.payload.action.as_deref())
}

/// Number of commits for push events.
pub fn commit_count(event: &GitHubEvent) -> Option<u64> {
    if event.event_type != "PushEvent" {
        return None;
    }
    event
        .payload
        .size
        .or_else(|| u64::try_from(event.payload.commits.len()).ok())
}

/// Derive the web base URL from an API base URL.
///
/// `https://api.github.com` maps to `https://github.com`; GitHub Enterprise
/// `https://host/api/v3` maps to `https://host`.
pub fn web_base_url(api_url: &str) -> String {
    let api_url = api_url.trim_end_matches('/');
    if api_url == DEFAULT_API_URL {
        return "https://github.com".to_string();
    }
    api_url.trim_end_matches("/api/v3").to_string()
}

/// Convert a GitHub event to a [`RawActivity`].
pub fn to_raw_activity(event: &GitHubEvent, web_base: &str) -> RawActivity {
    RawActivity {
        native_event_id: event.id.clone(),
        native_project_id: event.repo.id,
        project_name: event.repo.name.clone(),
        project_url: format!("{}/{}", web_base.trim_end_matches('/'), event.repo.name),
        action: canonical_action(event),
        created_at: event.created_at.clone(),
        commit_count: commit_count(event),
    }
}
