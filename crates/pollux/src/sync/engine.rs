//! Per-platform sync cycles.
//!
//! A [`PlatformSyncer`] owns everything one platform task needs: the event
//! source, the store connection and the keys of items committed by earlier
//! cycles. Cycles of one platform never overlap; a second concurrent call to
//! [`PlatformSyncer::run_cycle`] fails with [`SyncError::CycleInProgress`].
//!
//! One cycle:
//!
//! 1. read the checkpoint (`None` means full backfill)
//! 2. fetch from the source, bounded by `cycle_timeout`
//! 3. validate, keep items strictly newer than the checkpoint, sort them
//!    by timestamp and drop duplicates
//! 4. commit events and the new checkpoint in one transaction
//!
//! Transient failures restart the cycle with backoff. A failed cycle leaves
//! the store as it was.
//!
//! The platform row is created by cycles until one of them commits. After
//! that a removed platform stays removed and its cycles fail with
//! [`StoreError::NotFound`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio::sync::OwnedMutexGuard;

use crate::platform::{EventSource, FetchResult};
use crate::retry::with_retry;
use crate::store::{StoreError, find_platform, register_platform};

use super::commit::{CommitTask, await_commit_task, spawn_commit_task};
use super::errors::{Result, SyncError};
use super::normalize::{CommittedKeys, prepare_batch};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{CycleReport, SyncOptions};

/// Runs sync cycles for one platform.
pub struct PlatformSyncer {
    db: Arc<DatabaseConnection>,
    source: Arc<dyn EventSource>,
    options: SyncOptions,
    cycle_slot: Arc<tokio::sync::Mutex<()>>,
    committed: Arc<Mutex<CommittedKeys>>,
    registered: AtomicBool,
}

impl PlatformSyncer {
    pub fn new(
        db: Arc<DatabaseConnection>,
        source: Arc<dyn EventSource>,
        options: SyncOptions,
    ) -> Self {
        Self {
            db,
            source,
            options,
            cycle_slot: Arc::new(tokio::sync::Mutex::new(())),
            committed: Arc::new(Mutex::new(CommittedKeys::new())),
            registered: AtomicBool::new(false),
        }
    }

    /// Name of the platform this syncer feeds.
    pub fn platform(&self) -> &str {
        self.source.platform_name()
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Whether a cycle (or its commit) is currently running.
    pub fn is_running(&self) -> bool {
        self.cycle_slot.try_lock().is_err()
    }

    /// Wait until no cycle or commit of this platform is running.
    pub async fn wait_idle(&self) {
        let _slot = self.cycle_slot.lock().await;
    }

    /// Run one cycle, retrying transient failures.
    pub async fn run_cycle(&self, on_progress: Option<&ProgressCallback>) -> Result<CycleReport> {
        let platform = self.platform().to_string();
        let flight = match Arc::clone(&self.cycle_slot).try_lock_owned() {
            Ok(guard) => Arc::new(guard),
            Err(_) => return Err(SyncError::CycleInProgress { platform }),
        };

        let (result, attempts) = with_retry(
            || self.attempt(&flight, on_progress),
            &self.options.retry,
            |e: &SyncError| e.is_retryable(),
            &platform,
            on_progress,
        )
        .await;

        match result {
            Ok(mut report) => {
                report.attempts = attempts;
                tracing::info!(
                    platform = %platform,
                    inserted = report.inserted,
                    skipped = report.skipped(),
                    not_modified = report.not_modified,
                    checkpoint = ?report.checkpoint,
                    "Sync cycle complete"
                );
                emit(
                    on_progress,
                    SyncProgress::CycleComplete {
                        platform,
                        inserted: report.inserted,
                        skipped: report.skipped(),
                    },
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(platform = %platform, attempts, "Sync cycle failed: {}", err);
                emit(
                    on_progress,
                    SyncProgress::CycleFailed {
                        platform,
                        error: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    async fn attempt(
        &self,
        flight: &Arc<OwnedMutexGuard<()>>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<CycleReport> {
        let platform = self.platform();

        if !self.registered.load(Ordering::Acquire) {
            register_platform(&*self.db, platform).await?;
        }
        let since = find_platform(&*self.db, platform)
            .await?
            .ok_or_else(|| StoreError::platform_not_found(platform))?
            .last_sync
            .map(|ts| ts.with_timezone(&Utc));

        emit(
            on_progress,
            SyncProgress::CycleStarted {
                platform: platform.to_string(),
                since,
            },
        );

        let timeout = self.options.cycle_timeout;
        let fetched = tokio::time::timeout(timeout, self.source.fetch_since(since))
            .await
            .map_err(|_| SyncError::TimedOut {
                platform: platform.to_string(),
                after: timeout,
            })??;

        let mut report = CycleReport::new(platform, since);
        let (raw, etag) = match fetched {
            FetchResult::NotModified => {
                report.not_modified = true;
                tracing::debug!(platform = %platform, "Source reported no changes");
                emit(
                    on_progress,
                    SyncProgress::Fetched {
                        platform: platform.to_string(),
                        count: 0,
                        not_modified: true,
                    },
                );
                return Ok(report);
            }
            FetchResult::Fetched { data, etag } => (data, etag),
        };

        report.fetched = raw.len();
        emit(
            on_progress,
            SyncProgress::Fetched {
                platform: platform.to_string(),
                count: raw.len(),
                not_modified: false,
            },
        );

        let batch = {
            let committed = self.committed.lock().unwrap_or_else(|e| e.into_inner());
            prepare_batch(platform, since, &raw, &committed)
        };

        for item in &batch.malformed {
            tracing::warn!(
                platform = %platform,
                native_event_id = %item.native_event_id(),
                "Skipping malformed item: {}",
                item
            );
            emit(
                on_progress,
                SyncProgress::SkippedMalformed {
                    platform: platform.to_string(),
                    native_event_id: item.native_event_id().to_string(),
                    reason: item.to_string(),
                },
            );
        }
        report.malformed = batch.malformed.len();
        report.stale = batch.stale;
        report.duplicates = batch.duplicates;

        // An empty batch still moves the checkpoint up to now.
        let checkpoint = match batch.max_timestamp() {
            Some(latest) => latest,
            None => {
                let now = Utc::now();
                since.map_or(now, |since| since.max(now))
            }
        };

        let handle = spawn_commit_task(CommitTask {
            db: Arc::clone(&self.db),
            source: Arc::clone(&self.source),
            platform: platform.to_string(),
            items: batch.items,
            checkpoint,
            etag,
            committed: Arc::clone(&self.committed),
            flight: Arc::clone(flight),
        });
        let outcome = await_commit_task(handle).await?;
        self.registered.store(true, Ordering::Release);

        report.inserted = outcome.inserted;
        report.checkpoint = Some(outcome.checkpoint);
        report.projects_refreshed = outcome.projects_refreshed;

        emit(
            on_progress,
            SyncProgress::Committed {
                platform: platform.to_string(),
                inserted: outcome.inserted,
                checkpoint: outcome.checkpoint,
            },
        );

        Ok(report)
    }
}

impl std::fmt::Debug for PlatformSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSyncer")
            .field("platform", &self.platform())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
