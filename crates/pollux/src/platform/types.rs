use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conditional::FetchResult;
use super::errors::Result;

/// One activity item as delivered by a platform, before validation.
///
/// Fields are kept close to the wire: `created_at` is the raw timestamp
/// string and `action` the platform's own label after canonicalization by
/// the client. The sync engine validates and normalizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawActivity {
    /// Platform-native event id (used for de-duplication).
    pub native_event_id: String,
    /// Platform-native project id.
    pub native_project_id: Option<i64>,
    /// Project display name.
    pub project_name: String,
    /// Project web URL.
    pub project_url: String,
    /// Action label (e.g. "push", "merge_request.opened").
    pub action: String,
    /// When the activity happened, as reported by the platform.
    pub created_at: String,
    /// Number of commits for push-like activity.
    pub commit_count: Option<u64>,
}

/// A source of activity events for one hosting platform.
///
/// Implementations may return items at or before `since` and in any order;
/// the sync engine filters and sorts. `FetchResult::NotModified` signals that
/// the platform reported no changes at all.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Name of the platform this source feeds (matches `platforms.name`).
    fn platform_name(&self) -> &str;

    /// Fetch activity newer than `since` (`None` means full backfill).
    async fn fetch_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<FetchResult<Vec<RawActivity>>>;

    /// Called after the items of a fetch were durably committed, with the
    /// ETag that fetch returned. Sources that send conditional requests only
    /// start using an ETag once it has been acknowledged here, so a failed
    /// commit never turns the next fetch into a "not modified".
    fn acknowledge(&self, _etag: Option<&str>) {}
}
