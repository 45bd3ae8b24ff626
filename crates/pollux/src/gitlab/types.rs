//! GitLab API data types.

use serde::{Deserialize, Serialize};

/// gitlab.com host.
pub const DEFAULT_HOST: &str = "https://gitlab.com";

/// Events requested per page (GitLab maximum).
pub const EVENTS_PER_PAGE: u32 = 100;

/// An entry of `GET /users/{id}/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitLabEvent {
    pub id: i64,
    pub project_id: Option<i64>,
    /// Human-readable verb, e.g. "pushed to", "opened", "accepted".
    pub action_name: String,
    /// Kind of object acted on, e.g. "MergeRequest", "Issue", "Note".
    pub target_type: Option<String>,
    pub created_at: String,
    pub push_data: Option<GitLabPushData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitLabPushData {
    #[serde(default)]
    pub commit_count: u64,
    /// "pushed", "created" or "removed".
    pub action: Option<String>,
    /// "branch" or "tag".
    pub ref_type: Option<String>,
}

/// The fields of `GET /projects/{id}` used for the project catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabProject {
    pub id: i64,
    /// Full display name, e.g. "Group / Project".
    pub name_with_namespace: String,
    /// Full path, e.g. "group/project".
    pub path_with_namespace: String,
    pub web_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_push_event() {
        let json = serde_json::json!({
            "id": 12,
            "project_id": 42,
            "action_name": "pushed to",
            "target_id": null,
            "target_type": null,
            "author_id": 1,
            "created_at": "2024-01-01T10:00:00.000Z",
            "push_data": {
                "commit_count": 2,
                "action": "pushed",
                "ref_type": "branch",
                "ref": "main"
            }
        });

        let event: GitLabEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.project_id, Some(42));
        assert_eq!(event.action_name, "pushed to");
        assert!(event.target_type.is_none());
        assert_eq!(event.push_data.unwrap().commit_count, 2);
    }

    #[test]
    fn test_deserialize_project() {
        let json = serde_json::json!({
            "id": 42,
            "name": "pollux",
            "name_with_namespace": "Group / pollux",
            "path_with_namespace": "group/pollux",
            "web_url": "https://gitlab.com/group/pollux",
            "visibility": "public"
        });

        let project: GitLabProject = serde_json::from_value(json).unwrap();
        assert_eq!(project.path_with_namespace, "group/pollux");
    }
}
