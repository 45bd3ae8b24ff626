//! Sync options, cycle reports and shared constants.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::retry::RetryConfig;

use super::errors::SyncError;

/// Default interval between two cycles of the same platform.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// Default upper bound for the fetch phase of one cycle.
pub const DEFAULT_CYCLE_TIMEOUT_SECS: u64 = 120;

/// Maximum backoff delay in milliseconds between cycle retries.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Retries of a failed cycle before giving up until the next tick.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Per-cycle options of a [`PlatformSyncer`](super::PlatformSyncer).
///
/// How often cycles run is up to the caller; see
/// [`SyncScheduler`](super::SyncScheduler).
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Fetch phase timeout. Nothing is durable yet when it fires.
    pub cycle_timeout: Duration,
    /// Backoff for transient cycle failures.
    pub retry: RetryConfig,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            cycle_timeout: Duration::from_secs(DEFAULT_CYCLE_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

/// What one successful cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub platform: String,
    /// Checkpoint at the start of the cycle.
    pub since: Option<DateTime<Utc>>,
    /// Checkpoint after the cycle.
    pub checkpoint: Option<DateTime<Utc>>,
    /// The source reported no changes; nothing was written.
    pub not_modified: bool,
    /// Items delivered by the source.
    pub fetched: usize,
    /// Items at or before the checkpoint.
    pub stale: usize,
    /// Items skipped as malformed.
    pub malformed: usize,
    /// Items already ingested in this or an earlier cycle.
    pub duplicates: usize,
    /// Events appended.
    pub inserted: usize,
    /// Projects whose name or url were refreshed after commit.
    pub projects_refreshed: usize,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

impl CycleReport {
    pub fn new(platform: impl Into<String>, since: Option<DateTime<Utc>>) -> Self {
        Self {
            platform: platform.into(),
            since,
            checkpoint: since,
            ..Default::default()
        }
    }

    /// Items not ingested for any reason.
    pub fn skipped(&self) -> usize {
        self.stale + self.malformed + self.duplicates
    }
}

/// Result of one platform's cycle in a multi-platform run.
#[derive(Debug)]
pub struct PlatformOutcome {
    pub platform: String,
    pub result: Result<CycleReport, SyncError>,
}

impl PlatformOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
