//! Validation, filtering and de-duplication of fetched activity.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::platform::{RawActivity, parse_timestamp};
use crate::store::canonical_action_name;

/// Why a fetched item was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedItem {
    #[error("event {native_event_id} has an empty action")]
    EmptyAction { native_event_id: String },

    #[error("event {native_event_id} has no project id")]
    MissingProjectId { native_event_id: String },

    #[error("event {native_event_id} has an unparseable timestamp {value:?}")]
    InvalidTimestamp {
        native_event_id: String,
        value: String,
    },

    #[error("event without a native id (action {action:?})")]
    MissingEventId { action: String },
}

impl MalformedItem {
    /// The native id of the rejected item, empty when it had none.
    pub fn native_event_id(&self) -> &str {
        match self {
            Self::EmptyAction { native_event_id }
            | Self::MissingProjectId { native_event_id }
            | Self::InvalidTimestamp {
                native_event_id, ..
            } => native_event_id,
            Self::MissingEventId { .. } => "",
        }
    }
}

/// Identity of an activity item across cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub platform: String,
    pub native_project_id: i64,
    pub native_event_id: String,
}

/// A validated item ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedActivity {
    pub key: DedupKey,
    pub timestamp: DateTime<Utc>,
    pub project_name: String,
    pub project_url: String,
    /// Canonical action name.
    pub action: String,
}

/// Validate one raw item.
pub fn normalize(
    platform: &str,
    raw: &RawActivity,
) -> Result<NormalizedActivity, MalformedItem> {
    let native_event_id = raw.native_event_id.trim();
    if native_event_id.is_empty() {
        return Err(MalformedItem::MissingEventId {
            action: raw.action.clone(),
        });
    }

    let Some(action) = canonical_action_name(&raw.action) else {
        return Err(MalformedItem::EmptyAction {
            native_event_id: native_event_id.to_string(),
        });
    };

    let Some(native_project_id) = raw.native_project_id else {
        return Err(MalformedItem::MissingProjectId {
            native_event_id: native_event_id.to_string(),
        });
    };

    let Some(timestamp) = parse_timestamp(&raw.created_at) else {
        return Err(MalformedItem::InvalidTimestamp {
            native_event_id: native_event_id.to_string(),
            value: raw.created_at.clone(),
        });
    };

    let project_name = match raw.project_name.trim() {
        "" => format!("project-{}", native_project_id),
        name => name.to_string(),
    };

    Ok(NormalizedActivity {
        key: DedupKey {
            platform: platform.to_string(),
            native_project_id,
            native_event_id: native_event_id.to_string(),
        },
        timestamp,
        project_name,
        project_url: raw.project_url.trim().to_string(),
        action,
    })
}

/// Dedup keys of items committed by earlier cycles of one platform.
///
/// Only keys at the current checkpoint are kept: anything older is already
/// excluded by the checkpoint filter.
#[derive(Debug, Default)]
pub struct CommittedKeys {
    keys: HashMap<DedupKey, DateTime<Utc>>,
}

impl CommittedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &DedupKey) -> bool {
        self.keys.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Record a committed batch and drop keys older than `checkpoint`.
    pub fn remember<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a NormalizedActivity>,
        checkpoint: DateTime<Utc>,
    ) {
        for item in items {
            self.keys.insert(item.key.clone(), item.timestamp);
        }
        self.keys.retain(|_, timestamp| *timestamp >= checkpoint);
    }
}

/// Items of one fetch after validation, filtering and de-duplication.
#[derive(Debug, Default)]
pub struct PreparedBatch {
    /// Items to commit, in ascending timestamp order.
    pub items: Vec<NormalizedActivity>,
    /// Rejected items.
    pub malformed: Vec<MalformedItem>,
    /// Items at or before the checkpoint.
    pub stale: usize,
    /// Items already seen in this batch or committed earlier.
    pub duplicates: usize,
}

impl PreparedBatch {
    /// Latest timestamp among the items to commit.
    pub fn max_timestamp(&self) -> Option<DateTime<Utc>> {
        self.items.iter().map(|item| item.timestamp).max()
    }
}

/// Validate `raw`, keep items newer than `since`, sort them by timestamp
/// (stable) and drop duplicates.
pub fn prepare_batch(
    platform: &str,
    since: Option<DateTime<Utc>>,
    raw: &[RawActivity],
    committed: &CommittedKeys,
) -> PreparedBatch {
    let mut batch = PreparedBatch::default();
    let mut candidates = Vec::with_capacity(raw.len());

    for item in raw {
        match normalize(platform, item) {
            Ok(activity) => candidates.push(activity),
            Err(err) => batch.malformed.push(err),
        }
    }

    let before = candidates.len();
    candidates.retain(|item| since.is_none_or(|since| item.timestamp > since));
    batch.stale = before - candidates.len();

    candidates.sort_by_key(|item| item.timestamp);

    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(candidates.len());
    for item in candidates {
        if committed.contains(&item.key) || !seen.insert(item.key.clone()) {
            batch.duplicates += 1;
            continue;
        }
        batch.items.push(item);
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, project: Option<i64>, action: &str, created_at: &str) -> RawActivity {
        RawActivity {
            native_event_id: id.to_string(),
            native_project_id: project,
            project_name: "octocat/hello".to_string(),
            project_url: "https://github.com/octocat/hello".to_string(),
            action: action.to_string(),
            created_at: created_at.to_string(),
            commit_count: None,
        }
    }

    fn ts(raw: &str) -> DateTime<Utc> {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn test_normalize_valid_item() {
        let item = normalize("github", &raw("1", Some(7), " Push ", "2024-05-01T10:00:00Z")).unwrap();
        assert_eq!(item.action, "push");
        assert_eq!(item.key.native_project_id, 7);
        assert_eq!(item.key.platform, "github");
        assert_eq!(item.timestamp, ts("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_normalize_rejects_malformed_items() {
        assert!(matches!(
            normalize("github", &raw("1", Some(7), "  ", "2024-05-01T10:00:00Z")),
            Err(MalformedItem::EmptyAction { .. })
        ));
        assert!(matches!(
            normalize("github", &raw("2", None, "push", "2024-05-01T10:00:00Z")),
            Err(MalformedItem::MissingProjectId { .. })
        ));
        let err = normalize("github", &raw("3", Some(7), "push", "yesterday")).unwrap_err();
        assert_eq!(err.native_event_id(), "3");
        assert!(matches!(err, MalformedItem::InvalidTimestamp { .. }));
        assert!(matches!(
            normalize("github", &raw("", Some(7), "push", "2024-05-01T10:00:00Z")),
            Err(MalformedItem::MissingEventId { .. })
        ));
    }

    #[test]
    fn test_normalize_fills_missing_project_name() {
        let mut item = raw("1", Some(42), "push", "2024-05-01T10:00:00Z");
        item.project_name = String::new();
        assert_eq!(normalize("gitlab", &item).unwrap().project_name, "project-42");
    }

    #[test]
    fn test_prepare_batch_filters_sorts_and_dedups() {
        let since = Some(ts("2024-05-01T00:00:00Z"));
        let items = vec![
            raw("3", Some(1), "push", "2024-05-01T12:00:00Z"),
            raw("0", Some(1), "push", "2024-05-01T00:00:00Z"),
            raw("1", Some(1), "push", "2024-05-01T10:00:00Z"),
            raw("1", Some(1), "push", "2024-05-01T10:00:00Z"),
            raw("4", None, "push", "2024-05-01T11:00:00Z"),
        ];

        let batch = prepare_batch("github", since, &items, &CommittedKeys::new());

        let ids: Vec<_> = batch
            .items
            .iter()
            .map(|item| item.key.native_event_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(batch.stale, 1);
        assert_eq!(batch.duplicates, 1);
        assert_eq!(batch.malformed.len(), 1);
        assert_eq!(batch.max_timestamp(), Some(ts("2024-05-01T12:00:00Z")));
    }

    #[test]
    fn test_prepare_batch_stable_for_equal_timestamps() {
        let items = vec![
            raw("b", Some(1), "push", "2024-05-01T10:00:00Z"),
            raw("a", Some(1), "push", "2024-05-01T10:00:00Z"),
        ];
        let batch = prepare_batch("github", None, &items, &CommittedKeys::new());
        assert_eq!(batch.items[0].key.native_event_id, "b");
        assert_eq!(batch.items[1].key.native_event_id, "a");
    }

    #[test]
    fn test_committed_keys_skip_and_prune() {
        let first = prepare_batch(
            "github",
            None,
            &[
                raw("1", Some(1), "push", "2024-05-01T09:00:00Z"),
                raw("2", Some(1), "push", "2024-05-01T10:00:00Z"),
            ],
            &CommittedKeys::new(),
        );

        let mut committed = CommittedKeys::new();
        committed.remember(&first.items, ts("2024-05-01T10:00:00Z"));
        assert_eq!(committed.len(), 1);

        // Same-second re-delivery without a checkpoint filter is still caught.
        let again = prepare_batch(
            "github",
            None,
            &[raw("2", Some(1), "push", "2024-05-01T10:00:00Z")],
            &committed,
        );
        assert!(again.items.is_empty());
        assert_eq!(again.duplicates, 1);
    }
}
