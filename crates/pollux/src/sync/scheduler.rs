//! Periodic scheduling of platform cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use super::engine::PlatformSyncer;
use super::errors::SyncError;
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::PlatformOutcome;

/// Cycle counts of one platform task after shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformRunStats {
    pub platform: String,
    pub cycles: u64,
    pub failures: u64,
    pub inserted: u64,
    /// Shutdown arrived while a cycle was still running.
    pub cancelled: bool,
}

/// Drives one independent task per platform.
pub struct SyncScheduler {
    syncers: Vec<Arc<PlatformSyncer>>,
    interval: Duration,
    on_progress: Option<Arc<ProgressCallback>>,
}

impl SyncScheduler {
    pub fn new(syncers: Vec<Arc<PlatformSyncer>>, interval: Duration) -> Self {
        Self {
            syncers,
            interval,
            on_progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    pub fn platforms(&self) -> Vec<&str> {
        self.syncers.iter().map(|s| s.platform()).collect()
    }

    /// Run one cycle for every platform concurrently.
    ///
    /// Outcomes are returned sorted by platform name.
    pub async fn sync_all_once(&self) -> Vec<PlatformOutcome> {
        let mut tasks = JoinSet::new();
        for syncer in &self.syncers {
            let syncer = Arc::clone(syncer);
            let on_progress = self.on_progress.clone();
            tasks.spawn(async move {
                let result = syncer.run_cycle(on_progress.as_deref()).await;
                PlatformOutcome {
                    platform: syncer.platform().to_string(),
                    result,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(self.syncers.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Platform task failed: {}", e);
                    emit(
                        self.on_progress.as_deref(),
                        SyncProgress::Warning {
                            message: format!("Platform task failed: {}", e),
                        },
                    );
                }
            }
        }

        outcomes.sort_by(|a, b| a.platform.cmp(&b.platform));
        outcomes
    }

    /// Run cycles on every platform every `interval` until `shutdown` turns
    /// `true` or its sender is dropped.
    ///
    /// A cycle still fetching when shutdown arrives is abandoned. Commits
    /// already under way are waited for before returning.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Vec<PlatformRunStats> {
        let mut tasks = JoinSet::new();
        for syncer in &self.syncers {
            tasks.spawn(platform_loop(
                Arc::clone(syncer),
                self.interval,
                shutdown.clone(),
                self.on_progress.clone(),
            ));
        }

        let mut stats = Vec::with_capacity(self.syncers.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(platform_stats) => stats.push(platform_stats),
                Err(e) => tracing::error!("Platform task failed: {}", e),
            }
        }

        for syncer in &self.syncers {
            syncer.wait_idle().await;
        }

        stats.sort_by(|a, b| a.platform.cmp(&b.platform));
        stats
    }
}

async fn platform_loop(
    syncer: Arc<PlatformSyncer>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    on_progress: Option<Arc<ProgressCallback>>,
) -> PlatformRunStats {
    let platform = syncer.platform().to_string();
    let mut stats = PlatformRunStats {
        platform: platform.clone(),
        ..Default::default()
    };

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let cycle = syncer.run_cycle(on_progress.as_deref());
        tokio::pin!(cycle);

        let result = loop {
            tokio::select! {
                result = &mut cycle => break result,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break Err(SyncError::Cancelled);
                    }
                }
            }
        };

        match result {
            Ok(report) => {
                stats.cycles += 1;
                stats.inserted += report.inserted as u64;
            }
            Err(SyncError::Cancelled) => {
                // A started commit keeps running; `run` waits for it.
                tracing::info!(platform = %platform, "Shutdown requested, abandoning cycle");
                emit(
                    on_progress.as_deref(),
                    SyncProgress::CycleFailed {
                        platform: platform.clone(),
                        error: SyncError::Cancelled.to_string(),
                    },
                );
                stats.cancelled = true;
                break;
            }
            Err(SyncError::CycleInProgress { .. }) => {
                tracing::debug!(platform = %platform, "Previous cycle still running, skipping tick");
            }
            Err(_) => {
                // Already logged and reported by the cycle.
                stats.cycles += 1;
                stats.failures += 1;
            }
        }
    }

    stats
}
