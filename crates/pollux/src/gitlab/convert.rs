//! Conversion from GitLab events to platform-agnostic activity.

use crate::platform::{RawActivity, dotted_action, to_snake_case};

use super::types::{GitLabEvent, GitLabProject};

/// Canonical action for a GitLab event.
///
/// - `pushed to` / `pushed new` → `push`
/// - `opened` + `MergeRequest` → `merge_request.opened`
/// - `accepted` → `merged` (`merge_request.merged` with a target)
/// - `commented on` + `Note` → `note.commented`
pub fn canonical_action(event: &GitLabEvent) -> String {
    let verb = event.action_name.trim().to_lowercase();
    if verb.starts_with("pushed") {
        return "push".to_string();
    }

    let verb = match verb.as_str() {
        "accepted" => "merged".to_string(),
        "commented on" => "commented".to_string(),
        other => to_snake_case(other),
    };

    let target = event
        .target_type
        .as_deref()
        .map(|t| t.split("::").next().unwrap_or(t))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match target {
        Some(target) => dotted_action(&to_snake_case(target), Some(&verb)),
        None => verb,
    }
}

/// Display name and url of a project the API no longer serves.
pub fn placeholder_project(host: &str, project_id: i64) -> GitLabProject {
    GitLabProject {
        id: project_id,
        name_with_namespace: format!("project-{}", project_id),
        path_with_namespace: format!("project-{}", project_id),
        web_url: format!("{}/projects/{}", host.trim_end_matches('/'), project_id),
    }
}

/// Convert a GitLab event and its (looked up) project to a [`RawActivity`].
pub fn to_raw_activity(event: &GitLabEvent, project: Option<&GitLabProject>) -> RawActivity {
    let (project_name, project_url) = project
        .map(|p| (p.path_with_namespace.clone(), p.web_url.clone()))
        .unwrap_or_default();

    RawActivity {
        native_event_id: event.id.to_string(),
        native_project_id: event.project_id,
        project_name,
        project_url,
        action: canonical_action(event),
        created_at: event.created_at.clone(),
        commit_count: event.push_data.as_ref().map(|p| p.commit_count),
    }
}
